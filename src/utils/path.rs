use std::ffi::OsString;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};

/// 以 `/` 结尾的目标参数表示目录
pub fn is_dir_target(dest: &Path) -> bool {
    dest.as_os_str().as_encoded_bytes().last() == Some(&b'/')
}

/// 计算实际的目标文件路径
///
/// 目标为目录时，目标文件为 `目录 + basename(源文件)`；该目录必须已存在。
pub fn resolve_destination(src: &Path, dest: &Path) -> Result<PathBuf> {
    if !is_dir_target(dest) {
        return Ok(dest.to_path_buf());
    }

    let open_error = |source: io::Error| SyncError::DestinationOpen {
        path: dest.to_path_buf(),
        source,
    };

    if !dest.is_dir() {
        return Err(open_error(io::Error::new(
            ErrorKind::NotFound,
            "destination directory does not exist",
        )));
    }

    let name = src.file_name().ok_or_else(|| {
        open_error(io::Error::new(
            ErrorKind::InvalidInput,
            "source path has no file name",
        ))
    })?;
    Ok(dest.join(name))
}

/// 分段文件路径：`模板.NNN`
pub fn segment_path(template: &Path, index: u32) -> PathBuf {
    let mut path = OsString::from(template.as_os_str());
    path.push(format!(".{:03}", index));
    PathBuf::from(path)
}
