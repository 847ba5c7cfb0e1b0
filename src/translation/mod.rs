//! 翻译模块
//!
//! - **core**: 同步器状态机与事件通道
//! - **pipeline**: 文本发现、快照去重、分块请求、响应解码
//! - **backend**: 远端补全服务接口与 HTTP 实现
//! - **storage**: 翻译记忆与语言偏好
//! - **config**: 配置管理
//! - **error**: 错误处理

pub mod backend;
pub mod config;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod storage;

pub use backend::{CompletionBackend, CompletionRequest, HttpCompletionBackend, PromptMode};
pub use config::{constants, ConfigManager, TranslationConfig};
pub use self::core::{
    channel, pump_events, Mutation, RequestOutcome, SyncEvent, SyncHandle, SyncState, SyncStats,
    Synchronizer,
};
pub use error::{ErrorCategory, ErrorSeverity, TranslationError, TranslationResult};
pub use storage::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore, TranslationMemory};

