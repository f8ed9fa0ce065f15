use std::path::PathBuf;

/// 一次同步会话的统计结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub blocks_total: u64,
    pub blocks_modified: u64,
    pub bytes_total: u64,
    /// 被重写（或 dry-run 下需要重写）的块的起始偏移，按升序排列；
    /// 仅在 [`SyncOptions::record_offsets`](crate::sync::SyncOptions) 开启时记录
    pub modified_offsets: Vec<u64>,
    /// 保留下来的目标分段路径
    pub segments: Vec<PathBuf>,
}

impl SyncStats {
    pub fn is_modified(&self) -> bool {
        self.blocks_modified > 0
    }

    /// 被修改块所占百分比，没有处理任何块时为 0
    pub fn modified_ratio(&self) -> f64 {
        if self.blocks_total == 0 {
            return 0.0;
        }
        self.blocks_modified as f64 / self.blocks_total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_of_empty_session_is_zero() {
        assert_eq!(SyncStats::default().modified_ratio(), 0.0);
    }

    #[test]
    fn ratio_is_a_percentage() {
        let stats = SyncStats {
            blocks_total: 4,
            blocks_modified: 1,
            ..Default::default()
        };
        assert_eq!(stats.modified_ratio(), 25.0);
        assert!(stats.is_modified());
    }
}
