use std::io::{self, Read};
use std::path::Path;

use tracing::{info, trace};

use super::reader::{BlockBuffers, read_pair};
use super::segment::SegmentRotator;
use super::stats::SyncStats;
use super::writer::{BlockAction, apply_block, rewind};
use crate::BLOCK_SIZE;
use crate::error::{Result, SyncError};
use crate::utils::{open_source, resolve_destination};

/// 源文件参数为 `-` 时从标准输入读取
pub const STDIN_PATH: &str = "-";

/// 同步选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// 分段大小（字节），0 表示不分割
    pub split_size: u64,
    pub dry_run: bool,
    pub block_size: usize,
    /// 是否记录被修改块的偏移（会话报告使用）
    pub record_offsets: bool,
}

impl SyncOptions {
    pub fn new() -> Self {
        Self {
            split_size: 0,
            dry_run: false,
            block_size: BLOCK_SIZE,
            record_offsets: false,
        }
    }

    pub fn with_split_size(mut self, split_size: u64) -> Self {
        self.split_size = split_size;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_recorded_offsets(mut self, record_offsets: bool) -> Self {
        self.record_offsets = record_offsets;
        self
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// 处理完一个块之后发出的事件
#[derive(Debug, Clone, Copy)]
pub struct BlockEvent<'a> {
    /// 块在整个源数据流中的起始偏移
    pub offset: u64,
    pub len: usize,
    pub action: BlockAction,
    pub segment: &'a Path,
    /// 包括本块在内已处理的块数
    pub blocks_total: u64,
    pub block_size: usize,
}

/// 同步过程的观察者，用于进度显示等
pub trait SyncObserver {
    fn on_block(&mut self, _event: &BlockEvent<'_>) {}

    fn on_finish(&mut self, _stats: &SyncStats) {}
}

impl SyncObserver for () {}

/// 把 `src` 按块同步到 `dest`（或其分段）
///
/// 只有内容不同的块才会被写入。源数据读完后关闭当前分段，并截断目标中残留的旧数据。
pub fn sync_stream<S>(
    src: &mut S,
    dest: &Path,
    options: &SyncOptions,
    observer: &mut dyn SyncObserver,
) -> Result<SyncStats>
where
    S: Read + Send + ?Sized,
{
    if options.block_size == 0 {
        return Err(SyncError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            "block size must not be zero",
        )));
    }

    let mut buffers = BlockBuffers::new(options.block_size)?;
    let mut rotator = SegmentRotator::new(dest, options.split_size, options.dry_run)?;
    let mut stats = SyncStats::default();
    let mut offset: u64 = 0;

    info!(
        dest = %dest.display(),
        split_size = options.split_size,
        dry_run = options.dry_run,
        "starting block sync"
    );

    loop {
        let segment = rotator.current()?;
        let (handle, segment_path) = segment.handle_and_path();
        let pair = read_pair(src, handle, &mut buffers)?;

        if pair.is_source_eof() {
            rewind(handle, pair.dest.len())?;
            break;
        }

        let action = apply_block(handle, segment_path, &pair, options.dry_run)?;
        let len = pair.src.len();

        stats.blocks_total += 1;
        if action.is_modified() {
            stats.blocks_modified += 1;
            if options.record_offsets {
                stats.modified_offsets.push(offset);
            }
        }
        trace!(offset, len, ?action, "processed block");

        observer.on_block(&BlockEvent {
            offset,
            len,
            action,
            segment: segment_path,
            blocks_total: stats.blocks_total,
            block_size: options.block_size,
        });

        offset += len as u64;
        stats.bytes_total = offset;
        rotator.after_block(offset)?;
    }

    stats.segments = rotator.finish()?;
    info!(
        blocks_total = stats.blocks_total,
        blocks_modified = stats.blocks_modified,
        bytes = stats.bytes_total,
        "block sync finished"
    );
    observer.on_finish(&stats);
    Ok(stats)
}

/// 按路径同步
///
/// `src` 为 `-` 时读取标准输入；`dest` 以 `/` 结尾时视为目录，目标文件名取源文件名。
pub fn sync_file(
    src: &Path,
    dest: &Path,
    options: &SyncOptions,
    observer: &mut dyn SyncObserver,
) -> Result<SyncStats> {
    let mut source: Box<dyn Read + Send> = if src.as_os_str() == STDIN_PATH {
        Box::new(io::stdin())
    } else {
        let file = open_source(src).map_err(|source| SyncError::SourceOpen {
            path: src.to_path_buf(),
            source,
        })?;
        Box::new(file)
    };

    let dest = resolve_destination(src, dest)?;
    sync_stream(&mut *source, &dest, options, observer)
}
