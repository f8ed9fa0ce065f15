use std::io::{self, Write};

use tracing::warn;

use crate::sync::{BlockEvent, SyncObserver, SyncStats};

const MIB: u64 = 1024 * 1024;

/// 可覆盖重写的单行进度
///
/// 记录上一次输出的长度，下一次输出前先用空格擦除。
#[derive(Debug, Default)]
pub struct ProgressLine {
    last_len: usize,
    shown: bool,
}

impl ProgressLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update<W: Write + ?Sized>(&mut self, out: &mut W, text: &str) -> io::Result<()> {
        write!(out, "\r{}", " ".repeat(self.last_len))?;
        write!(out, "\r{}", text)?;
        out.flush()?;
        self.last_len = text.len();
        self.shown = true;
        Ok(())
    }

    /// 进度显示过时换行
    pub fn finish<W: Write + ?Sized>(&mut self, out: &mut W) -> io::Result<()> {
        if self.shown {
            writeln!(out)?;
            self.shown = false;
            self.last_len = 0;
        }
        Ok(())
    }
}

/// 进度行文本：`<分段路径> <已处理大小>M`
pub fn progress_text(event: &BlockEvent<'_>) -> String {
    let processed = event.blocks_total * event.block_size as u64;
    format!("{} {}M", event.segment.display(), processed / MIB)
}

/// 被修改块的提示行，偏移为 16 位大写十六进制
pub fn modified_block_line(offset: u64) -> String {
    format!("Modified block {:016X}", offset)
}

/// 统计信息
pub fn stat_summary(stats: &SyncStats) -> String {
    format!(
        "Stat:\n\tblocks total: {}\n\tblocks modified: {}\n\tblocks modified ratio: {:.2}%",
        stats.blocks_total,
        stats.blocks_modified,
        stats.modified_ratio()
    )
}

/// 把进度、被修改块和统计信息输出到终端（通常是标准错误）
pub struct ConsoleReporter<W: Write> {
    out: W,
    show_progress: bool,
    show_modified_blocks: bool,
    show_stat: bool,
    progress: ProgressLine,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            show_progress: false,
            show_modified_blocks: false,
            show_stat: false,
            progress: ProgressLine::new(),
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn with_modified_blocks(mut self, show: bool) -> Self {
        self.show_modified_blocks = show;
        self
    }

    pub fn with_stat(mut self, show: bool) -> Self {
        self.show_stat = show;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn report_block(&mut self, event: &BlockEvent<'_>) -> io::Result<()> {
        if self.show_modified_blocks && event.action.is_modified() {
            writeln!(self.out, "{}", modified_block_line(event.offset))?;
        }
        if self.show_progress {
            self.progress.update(&mut self.out, &progress_text(event))?;
        }
        Ok(())
    }

    fn report_finish(&mut self, stats: &SyncStats) -> io::Result<()> {
        self.progress.finish(&mut self.out)?;
        if self.show_stat {
            writeln!(self.out, "{}", stat_summary(stats))?;
        }
        self.out.flush()
    }
}

impl<W: Write> SyncObserver for ConsoleReporter<W> {
    fn on_block(&mut self, event: &BlockEvent<'_>) {
        if let Err(e) = self.report_block(event) {
            warn!(error = %e, "failed to write progress output");
        }
    }

    fn on_finish(&mut self, stats: &SyncStats) {
        if let Err(e) = self.report_finish(stats) {
            warn!(error = %e, "failed to write statistics");
        }
    }
}
