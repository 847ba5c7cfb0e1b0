//! # livetranslate
//!
//! 把文档中的可见文本增量同步为目标语言：记录每个文本节点的原文，
//! 去重后分块请求远端翻译服务，写回并标记；文档变化或路由切换时再次同步，
//! 随时可以还原原文。
//!
//! ## 模块组织
//!
//! - `parsers` - HTML 解析、序列化与节点操作
//! - `translation` - 同步器、翻译管道、远端后端、存储与配置
//! - `env` - 类型化环境变量

pub mod env;
pub mod parsers;
pub mod translation;

pub use parsers::{html_to_dom, serialize_document};
pub use translation::{
    RequestOutcome, SyncEvent, SyncHandle, SyncState, SyncStats, Synchronizer, TranslationConfig,
    TranslationError, TranslationResult,
};
