//! 同步器运行统计

use std::fmt;

/// 统计快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// 完成的翻译轮数（不含还原）
    pub cycles_completed: usize,
    /// 运行中收到、被合并进尾随轮的请求
    pub coalesced_requests: usize,
    pub restores: usize,
    pub nodes_applied: usize,
    /// 发现后、写回前已被移出文档的节点
    pub nodes_skipped_detached: usize,
    /// 等待期间被应用改写、本轮不再覆盖的节点
    pub nodes_skipped_stale: usize,
    pub strings_requested: usize,
    pub cache_hits: usize,
    pub passthrough_strings: usize,
    pub chunks_failed: usize,
}

impl SyncStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for SyncStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "轮数 {}, 合并 {}, 还原 {}, 写回 {}, 请求文本 {}, 缓存命中 {}, 原文直出 {}",
            self.cycles_completed,
            self.coalesced_requests,
            self.restores,
            self.nodes_applied,
            self.strings_requested,
            self.cache_hits,
            self.passthrough_strings
        )
    }
}
