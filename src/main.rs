use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use block_sync::cli::Cli;
use block_sync::error::{EXIT_COMMAND_LINE, EXIT_IO_FAILURE, EXIT_NOT_MODIFIED, SyncError};
use block_sync::{ConsoleReporter, SessionReport, sync_file};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help / --version
            if !e.use_stderr() {
                e.exit();
            }
            if let Err(err) = e.print() {
                tracing::warn!(error = %err, "failed to print command-line error");
            }
            return exit_code(EXIT_COMMAND_LINE);
        }
    };

    match run(&cli) {
        Ok(code) => exit_code(code),
        Err(err) => match err.downcast_ref::<SyncError>() {
            Some(sync_err) => {
                tracing::debug!(error = ?sync_err, "sync aborted");
                eprintln!("{}", sync_err);
                exit_code(sync_err.exit_code())
            }
            None => {
                eprintln!("{:#}", err);
                exit_code(EXIT_IO_FAILURE)
            }
        },
    }
}

fn run(cli: &Cli) -> Result<i32> {
    let options = cli.sync_options();
    let started_at = Utc::now();

    let mut reporter = ConsoleReporter::new(io::stderr())
        .with_progress(cli.progress)
        .with_modified_blocks(cli.show_modified_blocks)
        .with_stat(cli.stat);

    let stats = sync_file(&cli.src, &cli.dest, &options, &mut reporter)?;

    if let Some(path) = &cli.report {
        SessionReport::new(&cli.src, &cli.dest, &options, &stats, started_at).write_to(path)?;
    }

    if cli.return_true_if_modified && !stats.is_modified() {
        return Ok(EXIT_NOT_MODIFIED);
    }
    Ok(0)
}

/// 负数退出码由操作系统按 256 取模
fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(code as u8)
}
