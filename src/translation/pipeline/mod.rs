//! 翻译管道模块
//!
//! 一轮翻译的各个阶段：发现可见文本、快照与去重、分块请求、解码响应。

pub mod batch;
pub mod collector;
pub mod filters;
pub mod response;
pub mod snapshot;

// 重新导出主要类型
pub use batch::{BatchConfig, BatchOutput, BatchStats, BatchTranslator};
pub use collector::{CollectionStats, TextCollector};
pub use filters::{is_blank, normalize_whitespace, wrap_like_original, Exclusion, NodeFilter};
pub use response::{decode_string_list, DecodeStrategy, Decoded};
pub use snapshot::{BatchMember, CycleBatch, SnapshotStore, TrackedText};
