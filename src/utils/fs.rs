use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::Path;

use tracing::debug;

/// 以只读方式打开源文件，平台支持时不更新访问时间
pub fn open_source(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true);
    open_preferring_noatime(&options, path, 0)
}

/// 以读写方式打开（必要时创建）目标分段，每次写入都同步落盘
pub fn open_destination(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true).truncate(false);
    open_preferring_noatime(&options, path, durable_flags())
}

/// 以只读方式打开目标分段，文件不存在时返回 `None`
///
/// 只读打开目录不会失败，这里按读写打开时的 `EISDIR` 处理。
pub fn open_destination_readonly(path: &Path) -> io::Result<Option<File>> {
    let mut options = OpenOptions::new();
    options.read(true);
    let file = match open_preferring_noatime(&options, path, 0) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    if file.metadata()?.is_dir() {
        return Err(io::Error::new(
            ErrorKind::IsADirectory,
            format!("{} is a directory", path.display()),
        ));
    }
    Ok(Some(file))
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn open_preferring_noatime(options: &OpenOptions, path: &Path, flags: i32) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut noatime = options.clone();
    noatime.custom_flags(flags | libc::O_NOATIME);
    match noatime.open(path) {
        Ok(file) => return Ok(file),
        // 非文件所有者无权使用 O_NOATIME
        Err(e) if matches!(e.raw_os_error(), Some(libc::EPERM | libc::EINVAL)) => {
            debug!(path = %path.display(), "O_NOATIME refused, opening without it");
        }
        Err(e) => return Err(e),
    }

    let mut plain = options.clone();
    plain.custom_flags(flags);
    plain.open(path)
}

#[cfg(all(unix, not(any(target_os = "linux", target_os = "android"))))]
fn open_preferring_noatime(options: &OpenOptions, path: &Path, flags: i32) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut plain = options.clone();
    plain.custom_flags(flags);
    plain.open(path)
}

#[cfg(not(unix))]
fn open_preferring_noatime(options: &OpenOptions, path: &Path, _flags: i32) -> io::Result<File> {
    options.open(path)
}

#[cfg(unix)]
fn durable_flags() -> i32 {
    libc::O_DSYNC
}

#[cfg(not(unix))]
fn durable_flags() -> i32 {
    0
}
