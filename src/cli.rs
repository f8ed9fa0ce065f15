use clap::Parser;
use std::path::PathBuf;

use crate::sync::SyncOptions;

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * MIB;

/// 按块增量复制文件，内容相同的块不会被重写
#[derive(Parser, Debug)]
#[command(name = "bsync", version)]
#[command(
    about = "copy srcFile to destFile but do not overwrite same blocks",
    long_about = "copy srcFile to destFile but do not overwrite same blocks\n\
                  if destDir/ is passed then destFile = destDir + basename(srcFile)"
)]
pub struct Cli {
    /// 分割为 destFile.000、destFile.001 ... 每段 N 兆或 N 吉字节，如 `700M`、`4G`
    #[arg(short = 'S', long = "split-size", value_name = "N(M|G)", value_parser = parse_split_size)]
    pub split_size: Option<u64>,

    /// 只比较，不写入目标
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// 显示进度
    #[arg(short = '#', long)]
    pub progress: bool,

    /// 没有任何块被修改时以退出码 1 结束
    #[arg(short = 'r', long = "return-true-if-modified")]
    pub return_true_if_modified: bool,

    /// 输出统计信息
    #[arg(short = 's', long)]
    pub stat: bool,

    /// 输出被修改块的偏移
    #[arg(short = 'm', long = "show-modified-blocks")]
    pub show_modified_blocks: bool,

    /// 将会话报告写入 TOML 文件
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// 源文件，`-` 表示标准输入
    #[arg(value_name = "srcFile")]
    pub src: PathBuf,

    /// 目标文件，或以 `/` 结尾的目录
    #[arg(value_name = "destFile")]
    pub dest: PathBuf,
}

impl Cli {
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions::new()
            .with_split_size(self.split_size.unwrap_or(0))
            .with_dry_run(self.dry_run)
            .with_recorded_offsets(self.report.is_some())
    }
}

/// 解析 `--split-size`：十进制正整数加 `M` 或 `G` 后缀
pub fn parse_split_size(value: &str) -> Result<u64, String> {
    let digits_end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, suffix) = value.split_at(digits_end);

    let count: u64 = digits
        .parse()
        .map_err(|_| "Could not parse --split-size".to_string())?;

    let mut chars = suffix.chars();
    let multiplier = match (chars.next(), chars.next()) {
        (Some('M'), None) => MIB,
        (Some('G'), None) => GIB,
        (None, _) => return Err("Could not parse --split-size".to_string()),
        (Some(c), _) => return Err(format!("Could not parse --split-size postfix {}", c)),
    };

    if count == 0 {
        return Err("Could not parse --split-size: size must be positive".to_string());
    }

    count
        .checked_mul(multiplier)
        .ok_or_else(|| "Could not parse --split-size: size is too large".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn split_size_accepts_mebi_and_gibi() {
        assert_eq!(parse_split_size("700M"), Ok(700 * MIB));
        assert_eq!(parse_split_size("4G"), Ok(4 * GIB));
    }

    #[test]
    fn split_size_rejects_bad_input() {
        assert_eq!(
            parse_split_size("10"),
            Err("Could not parse --split-size".to_string())
        );
        assert_eq!(
            parse_split_size("10K"),
            Err("Could not parse --split-size postfix K".to_string())
        );
        assert!(parse_split_size("M").is_err());
        assert!(parse_split_size("0M").is_err());
        assert!(parse_split_size("10MB").is_err());
    }

    #[test]
    fn parses_short_flags_and_positionals() {
        let cli = Cli::try_parse_from([
            "bsync", "-n", "-#", "-r", "-s", "-m", "-S", "2G", "-", "out/",
        ])
        .unwrap();
        assert!(cli.dry_run && cli.progress && cli.return_true_if_modified);
        assert!(cli.stat && cli.show_modified_blocks);
        assert_eq!(cli.split_size, Some(2 * GIB));
        assert_eq!(cli.src, PathBuf::from("-"));
        assert_eq!(cli.dest, PathBuf::from("out/"));
        assert_eq!(cli.sync_options().split_size, 2 * GIB);
        assert!(!cli.sync_options().record_offsets);
    }

    #[test]
    fn report_turns_on_offset_recording() {
        let cli =
            Cli::try_parse_from(["bsync", "--report", "run.toml", "src.img", "dest.img"])
                .unwrap();
        assert!(cli.sync_options().record_offsets);
    }

    #[test]
    fn missing_destination_is_an_error() {
        assert!(Cli::try_parse_from(["bsync", "src.img"]).is_err());
    }
}
