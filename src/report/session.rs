use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::sync::{SyncOptions, SyncStats};

/// 会话报告（TOML），记录一次同步的参数与结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub version: String,
    pub started_at: String,
    pub finished_at: String,
    pub source: String,
    pub destination: String,
    pub block_size: u64,
    pub split_size: u64,
    pub dry_run: bool,
    pub blocks_total: u64,
    pub blocks_modified: u64,
    pub bytes_total: u64,
    pub modified_ratio: f64,
    pub modified_offsets: Vec<u64>,
    pub segments: Vec<String>,
}

impl SessionReport {
    pub fn new(
        source: &Path,
        destination: &Path,
        options: &SyncOptions,
        stats: &SyncStats,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: started_at.to_rfc3339(),
            finished_at: Utc::now().to_rfc3339(),
            source: source.to_string_lossy().into_owned(),
            destination: destination.to_string_lossy().into_owned(),
            block_size: options.block_size as u64,
            split_size: options.split_size,
            dry_run: options.dry_run,
            blocks_total: stats.blocks_total,
            blocks_modified: stats.blocks_modified,
            bytes_total: stats.bytes_total,
            modified_ratio: stats.modified_ratio(),
            modified_offsets: stats.modified_offsets.clone(),
            segments: stats
                .segments
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect(),
        }
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).with_context(|| "无法序列化会话报告")?;
        fs::write(path, content).with_context(|| format!("无法写入会话报告: {:?}", path))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("无法读取会话报告: {:?}", path))?;
        let report = toml::from_str(&content).with_context(|| "无法解析会话报告")?;
        Ok(report)
    }
}
