use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use super::compare::blocks_differ;
use super::reader::BlockPair;
use crate::error::{Result, SyncError};

/// 对单个块做出的处理
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockAction {
    /// 内容相同，未写入
    Unchanged,
    /// 内容不同，已重写
    Rewritten,
    /// 内容不同，但处于 dry-run 模式
    Simulated,
}

impl BlockAction {
    pub fn is_modified(self) -> bool {
        !matches!(self, BlockAction::Unchanged)
    }
}

/// 根据比较结果处理目标块
///
/// 调用前目标游标位于块起点之后 `pair.dest.len()` 字节处；返回后游标一定位于
/// 块起点之后 `pair.src.len()` 字节处。
pub fn apply_block<D>(
    dest: &mut D,
    path: &Path,
    pair: &BlockPair<'_>,
    dry_run: bool,
) -> Result<BlockAction>
where
    D: Write + Seek + ?Sized,
{
    if !blocks_differ(pair.src, pair.dest) {
        return Ok(BlockAction::Unchanged);
    }

    rewind(dest, pair.dest.len())?;

    if dry_run {
        dest.seek(SeekFrom::Current(offset_of(pair.src.len())))?;
        return Ok(BlockAction::Simulated);
    }

    dest.write_all(pair.src).map_err(|source| SyncError::DiskFull {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BlockAction::Rewritten)
}

/// 把游标退回到本次读取之前的位置
pub fn rewind<D: Seek + ?Sized>(dest: &mut D, consumed: usize) -> Result<()> {
    if consumed > 0 {
        dest.seek(SeekFrom::Current(-offset_of(consumed)))?;
    }
    Ok(())
}

fn offset_of(len: usize) -> i64 {
    // 块大小远小于 i64::MAX
    len as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    fn read_block(cursor: &mut Cursor<Vec<u8>>, len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        let n = cursor.read(&mut buf).unwrap();
        buf.truncate(n);
        buf
    }

    #[test]
    fn unchanged_block_keeps_cursor_after_block() {
        let mut dest = Cursor::new(b"aaaabbbb".to_vec());
        let dest_block = read_block(&mut dest, 4);
        let pair = BlockPair {
            src: b"aaaa",
            dest: &dest_block,
        };

        let action = apply_block(&mut dest, Path::new("dest"), &pair, false).unwrap();
        assert_eq!(action, BlockAction::Unchanged);
        assert_eq!(dest.position(), 4);
        assert_eq!(dest.get_ref(), b"aaaabbbb");
    }

    #[test]
    fn different_block_is_rewritten_in_place() {
        let mut dest = Cursor::new(b"aaaabbbb".to_vec());
        let dest_block = read_block(&mut dest, 4);
        let pair = BlockPair {
            src: b"cccc",
            dest: &dest_block,
        };

        let action = apply_block(&mut dest, Path::new("dest"), &pair, false).unwrap();
        assert_eq!(action, BlockAction::Rewritten);
        assert_eq!(dest.position(), 4);
        assert_eq!(dest.get_ref(), b"ccccbbbb");
    }

    #[test]
    fn longer_source_block_extends_destination() {
        let mut dest = Cursor::new(b"aa".to_vec());
        let dest_block = read_block(&mut dest, 4);
        let pair = BlockPair {
            src: b"aaaa",
            dest: &dest_block,
        };

        apply_block(&mut dest, Path::new("dest"), &pair, false).unwrap();
        assert_eq!(dest.position(), 4);
        assert_eq!(dest.get_ref(), b"aaaa");
    }

    #[test]
    fn dry_run_moves_cursor_without_writing() {
        let mut dest = Cursor::new(b"aa".to_vec());
        let dest_block = read_block(&mut dest, 4);
        let pair = BlockPair {
            src: b"bbbb",
            dest: &dest_block,
        };

        let action = apply_block(&mut dest, Path::new("dest"), &pair, true).unwrap();
        assert_eq!(action, BlockAction::Simulated);
        assert!(action.is_modified());
        assert_eq!(dest.position(), 4);
        assert_eq!(dest.get_ref(), b"aa");
    }

    #[test]
    fn short_write_is_disk_full() {
        let mut storage = [0u8; 2];
        let mut dest = Cursor::new(&mut storage[..]);
        let pair = BlockPair {
            src: b"abcd",
            dest: b"",
        };

        let err = apply_block(&mut dest, Path::new("dest"), &pair, false).unwrap_err();
        assert!(matches!(err, SyncError::DiskFull { .. }));
        assert_eq!(err.exit_code(), -4);
    }
}
