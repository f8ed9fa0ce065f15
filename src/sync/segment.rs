use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, SyncError};
use crate::utils::{open_destination, open_destination_readonly, segment_path};

/// 目标分段的底层句柄
///
/// dry-run 模式下目标文件可能不存在，此时按空文件处理，只记录游标位置。
#[derive(Debug)]
pub enum SegmentHandle {
    Disk(File),
    Missing { pos: u64 },
}

impl Read for SegmentHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            SegmentHandle::Disk(file) => file.read(buf),
            SegmentHandle::Missing { .. } => Ok(0),
        }
    }
}

impl Write for SegmentHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            SegmentHandle::Disk(file) => file.write(buf),
            SegmentHandle::Missing { .. } => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "destination segment was opened for dry run",
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            SegmentHandle::Disk(file) => file.flush(),
            SegmentHandle::Missing { .. } => Ok(()),
        }
    }
}

impl Seek for SegmentHandle {
    fn seek(&mut self, target: SeekFrom) -> io::Result<u64> {
        match self {
            SegmentHandle::Disk(file) => file.seek(target),
            SegmentHandle::Missing { pos } => {
                let next = match target {
                    SeekFrom::Start(n) => Some(n),
                    SeekFrom::Current(delta) => pos.checked_add_signed(delta),
                    // 不存在的文件长度为 0
                    SeekFrom::End(delta) => u64::try_from(delta).ok(),
                };
                *pos = next.ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidInput, "seek before start of segment")
                })?;
                Ok(*pos)
            }
        }
    }
}

/// 一个目标分段（未启用分割时即目标文件本身）
#[derive(Debug)]
pub struct Segment {
    index: u32,
    path: PathBuf,
    handle: SegmentHandle,
    created: bool,
}

impl Segment {
    /// 打开分段；`split` 为假时直接使用模板路径
    pub fn open(template: &Path, index: u32, split: bool, dry_run: bool) -> Result<Self> {
        let path = if split {
            segment_path(template, index)
        } else {
            template.to_path_buf()
        };
        let open_error = |source: io::Error| SyncError::DestinationOpen {
            path: path.clone(),
            source,
        };

        let (handle, created) = if dry_run {
            let handle = match open_destination_readonly(&path).map_err(open_error)? {
                Some(file) => SegmentHandle::Disk(file),
                None => SegmentHandle::Missing { pos: 0 },
            };
            (handle, false)
        } else {
            let existed = path.exists();
            let file = open_destination(&path).map_err(open_error)?;
            (SegmentHandle::Disk(file), !existed)
        };

        debug!(path = %path.display(), index, created, "opened destination segment");
        Ok(Self {
            index,
            path,
            handle,
            created,
        })
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 同时借出句柄和路径
    pub fn handle_and_path(&mut self) -> (&mut SegmentHandle, &Path) {
        (&mut self.handle, &self.path)
    }

    /// 当前游标位置，即本分段已处理的逻辑长度
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.handle.stream_position()?)
    }

    /// 关闭分段
    ///
    /// 游标之后若还有旧数据则截断到游标处；dry-run 模式不修改文件。返回分段的逻辑长度。
    pub fn close(mut self, dry_run: bool) -> Result<u64> {
        let len = self.position()?;
        if let SegmentHandle::Disk(file) = &self.handle
            && !dry_run
        {
            let on_disk = file.metadata()?.len();
            if on_disk > len {
                debug!(
                    path = %self.path.display(),
                    from = on_disk,
                    to = len,
                    "truncating stale tail"
                );
                file.set_len(len)?;
            }
        }
        debug!(path = %self.path.display(), len, "closed destination segment");
        Ok(len)
    }
}

/// 分段轮换状态
#[derive(Debug)]
enum State {
    Closed,
    Open(Segment),
}

/// 分段轮换器
///
/// 全局偏移到达下一个分割边界时关闭当前分段，下一次访问时再打开编号加一的分段。
/// 分割边界是一个独立累加的值，不由偏移重新计算。
#[derive(Debug)]
pub struct SegmentRotator {
    template: PathBuf,
    split_size: u64,
    dry_run: bool,
    state: State,
    index: u32,
    next_bound: u64,
    segments: Vec<PathBuf>,
}

impl SegmentRotator {
    /// 创建轮换器并立即打开第一个分段，`split_size` 为 0 表示不分割
    pub fn new(template: &Path, split_size: u64, dry_run: bool) -> Result<Self> {
        let mut rotator = Self {
            template: template.to_path_buf(),
            split_size,
            dry_run,
            state: State::Closed,
            index: 0,
            next_bound: split_size,
            segments: Vec::new(),
        };
        rotator.current()?;
        Ok(rotator)
    }

    pub fn is_split(&self) -> bool {
        self.split_size > 0
    }

    /// 当前打开的分段，处于关闭状态时打开下一个分段
    pub fn current(&mut self) -> Result<&mut Segment> {
        if let State::Closed = self.state {
            let segment =
                Segment::open(&self.template, self.index, self.is_split(), self.dry_run)?;
            self.segments.push(segment.path().to_path_buf());
            self.state = State::Open(segment);
        }
        match &mut self.state {
            State::Open(segment) => Ok(segment),
            State::Closed => unreachable!("segment was opened above"),
        }
    }

    /// 处理完一个块后检查是否需要轮换
    pub fn after_block(&mut self, offset: u64) -> Result<()> {
        if !self.is_split() || offset < self.next_bound {
            return Ok(());
        }
        self.next_bound += self.split_size;
        self.close_current()?;
        self.index += 1;
        debug!(
            offset,
            next_bound = self.next_bound,
            index = self.index,
            "rotating segment"
        );
        Ok(())
    }

    /// 结束会话，关闭当前分段并返回所有保留下来的分段路径
    pub fn finish(mut self) -> Result<Vec<PathBuf>> {
        self.close_current()?;
        Ok(self.segments)
    }

    fn close_current(&mut self) -> Result<()> {
        let State::Open(segment) = std::mem::replace(&mut self.state, State::Closed) else {
            return Ok(());
        };

        let index = segment.index();
        let created = segment.created;
        let path = segment.path().to_path_buf();
        let len = segment.close(self.dry_run)?;

        // 源恰好在分割边界结束时，最后一个分段没有任何数据
        if index > 0 && len == 0 {
            self.segments.pop();
            if created && !self.dry_run {
                debug!(path = %path.display(), "removing empty trailing segment");
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn rotator_opens_next_segment_lazily_after_bound() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("out.img");
        let mut rotator = SegmentRotator::new(&template, 10, false).unwrap();

        rotator.after_block(4).unwrap();
        assert_eq!(rotator.current().unwrap().index(), 0);

        rotator.after_block(12).unwrap();
        assert!(!dir.path().join("out.img.001").exists());
        let segment = rotator.current().unwrap();
        assert_eq!(segment.index(), 1);
        segment.handle_and_path().0.write_all(b"data").unwrap();
        assert!(dir.path().join("out.img.001").exists());

        // 空的尾部分段被移除
        rotator.after_block(20).unwrap();
        rotator.current().unwrap();
        let segments = rotator.finish().unwrap();
        assert_eq!(
            segments,
            vec![dir.path().join("out.img.000"), dir.path().join("out.img.001")]
        );
        assert!(!dir.path().join("out.img.002").exists());
    }

    #[test]
    fn dry_run_rotator_does_not_create_segments() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("out.img");
        let mut rotator = SegmentRotator::new(&template, 10, true).unwrap();

        rotator.after_block(10).unwrap();
        rotator.current().unwrap();
        let segments = rotator.finish().unwrap();

        assert_eq!(segments, vec![dir.path().join("out.img.000")]);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
