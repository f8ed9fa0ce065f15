use std::io::{self, ErrorKind, Read};
use std::panic;
use std::thread;

use crate::error::{Result, SyncError};

/// 一次迭代读取到的源块与目标块
#[derive(Debug, Clone, Copy)]
pub struct BlockPair<'a> {
    pub src: &'a [u8],
    pub dest: &'a [u8],
}

impl BlockPair<'_> {
    /// 源已读完
    pub fn is_source_eof(&self) -> bool {
        self.src.is_empty()
    }
}

/// 源和目标各自的块缓冲区，整个会话期间复用
pub struct BlockBuffers {
    src: Vec<u8>,
    dest: Vec<u8>,
}

impl BlockBuffers {
    /// 分配两块 `block_size` 大小的缓冲区，内存不足时返回 [`SyncError::NoMemory`]
    pub fn new(block_size: usize) -> Result<Self> {
        Ok(Self {
            src: alloc_block(block_size)?,
            dest: alloc_block(block_size)?,
        })
    }
}

fn alloc_block(block_size: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(block_size).map_err(|_| SyncError::NoMemory)?;
    buf.resize(block_size, 0);
    Ok(buf)
}

/// 尽量读满 `buf`
///
/// 非 EOF 的短读会继续读取，直到缓冲区填满或遇到 EOF。返回实际读取的字节数。
pub fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// 并发读取源和目标的下一个块
///
/// 两个读取各自在一个作用域线程中执行，两者都完成后才返回。
pub fn read_pair<'b, S, D>(
    src: &mut S,
    dest: &mut D,
    buffers: &'b mut BlockBuffers,
) -> Result<BlockPair<'b>>
where
    S: Read + Send + ?Sized,
    D: Read + Send + ?Sized,
{
    let BlockBuffers {
        src: src_buf,
        dest: dest_buf,
    } = buffers;

    let (src_result, dest_result) = thread::scope(|scope| {
        let src_task = scope.spawn(|| read_full(src, &mut src_buf[..]));
        let dest_task = scope.spawn(|| read_full(dest, &mut dest_buf[..]));
        (join(src_task), join(dest_task))
    });

    let src_len = src_result?;
    let dest_len = dest_result?;

    Ok(BlockPair {
        src: &src_buf[..src_len],
        dest: &dest_buf[..dest_len],
    })
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, T>) -> T {
    handle
        .join()
        .unwrap_or_else(|payload| panic::resume_unwind(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// 每次最多返回 `chunk` 字节的读取器，模拟管道
    struct Trickle<'a> {
        data: &'a [u8],
        chunk: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.chunk.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn read_full_retries_short_reads() {
        let data = vec![7u8; 100];
        let mut reader = Trickle {
            data: &data,
            chunk: 3,
        };
        let mut buf = [0u8; 64];
        assert_eq!(read_full(&mut reader, &mut buf).unwrap(), 64);
        assert_eq!(read_full(&mut reader, &mut buf).unwrap(), 36);
        assert_eq!(read_full(&mut reader, &mut buf).unwrap(), 0);
    }

    #[test]
    fn read_pair_reports_shorter_destination() {
        let mut src = Cursor::new(vec![1u8; 10]);
        let mut dest = Cursor::new(vec![1u8; 4]);
        let mut buffers = BlockBuffers::new(8).unwrap();

        let pair = read_pair(&mut src, &mut dest, &mut buffers).unwrap();
        assert_eq!(pair.src.len(), 8);
        assert_eq!(pair.dest.len(), 4);
        assert_eq!(src.position(), 8);
        assert_eq!(dest.position(), 4);
    }

    #[test]
    fn read_pair_propagates_read_errors() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("device gone"))
            }
        }

        let mut src = Cursor::new(vec![0u8; 4]);
        let mut buffers = BlockBuffers::new(4).unwrap();
        let err = read_pair(&mut src, &mut Broken, &mut buffers).unwrap_err();
        assert_eq!(err.exit_code(), -6);
    }
}
