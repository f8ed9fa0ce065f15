//! # Block Sync
//!
//! 按固定大小的块增量同步文件
//!
//! ## 功能
//!
//! - 并发读取源与目标的同一个块，只重写内容不同的块，减少对目标介质的写入
//! - 目标比源长时截断多余的旧数据
//! - 可选按大小分割目标文件（`目标.000`、`目标.001` ...）
//! - 支持 dry-run，只统计不写入
//!
//! ## 使用示例
//!
//! ```no_run
//! use block_sync::sync::{SyncOptions, sync_file};
//! use std::path::Path;
//!
//! let options = SyncOptions::new().with_split_size(4 * 1024 * 1024 * 1024);
//! let stats = sync_file(
//!     Path::new("disk.img"),
//!     Path::new("/mnt/backup/"),
//!     &options,
//!     &mut (),
//! )
//! .unwrap();
//! println!("{} / {}", stats.blocks_modified, stats.blocks_total);
//! ```

pub mod cli;
pub mod error;
pub mod report;
pub mod sync;
pub mod utils;

/// 默认块大小：1 MiB
pub const BLOCK_SIZE: usize = 1024 * 1024;

// 重新导出常用类型
pub use error::{EXIT_NOT_MODIFIED, SyncError};
pub use report::{ConsoleReporter, SessionReport};
pub use sync::{SyncObserver, SyncOptions, SyncStats, sync_file, sync_stream};
