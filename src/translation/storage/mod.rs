//! 存储模块
//!
//! 翻译记忆和语言偏好。

pub mod cache;
pub mod preference;

pub use cache::{CacheConfig, CacheStats, TranslationMemory};
pub use preference::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore};
