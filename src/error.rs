use std::io;
use std::path::PathBuf;

/// 指定 `-r` 且没有任何块被重写时的退出码
pub const EXIT_NOT_MODIFIED: i32 = 1;

pub const EXIT_NO_MEMORY: i32 = -1;
pub const EXIT_SOURCE_OPEN: i32 = -2;
pub const EXIT_DESTINATION_OPEN: i32 = -3;
pub const EXIT_DISK_FULL: i32 = -4;
pub const EXIT_COMMAND_LINE: i32 = -5;
pub const EXIT_IO_FAILURE: i32 = -6;

/// 同步过程中的致命错误
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Could not allocate memory for buffer")]
    NoMemory,

    #[error("Could not open srcFile {}", path.display())]
    SourceOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not open destFile {}", path.display())]
    DestinationOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not write to destFile {}. No disk space", path.display())]
    DiskFull {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    CommandLine(String),

    #[error("Generic io error")]
    Io(#[from] io::Error),
}

impl SyncError {
    /// 该错误对应的进程退出码
    pub fn exit_code(&self) -> i32 {
        match self {
            SyncError::NoMemory => EXIT_NO_MEMORY,
            SyncError::SourceOpen { .. } => EXIT_SOURCE_OPEN,
            SyncError::DestinationOpen { .. } => EXIT_DESTINATION_OPEN,
            SyncError::DiskFull { .. } => EXIT_DISK_FULL,
            SyncError::CommandLine(_) => EXIT_COMMAND_LINE,
            SyncError::Io(_) => EXIT_IO_FAILURE,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
