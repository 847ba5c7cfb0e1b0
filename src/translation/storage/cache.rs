//! 翻译记忆
//!
//! 以 (目标语言, 归一化原文) 为键缓存成功的译文，避免切换语言来回时重复请求。
//! 原文直出的结果不入缓存，下一轮仍会重新请求。

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::translation::config::{constants, TranslationConfig};

/// 缓存配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_size: constants::DEFAULT_CACHE_SIZE,
        }
    }
}

impl From<&TranslationConfig> for CacheConfig {
    fn from(config: &TranslationConfig) -> Self {
        Self {
            enabled: config.cache_enabled,
            max_size: config.cache_size,
        }
    }
}

/// 缓存统计信息
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub total_entries: usize,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.total_requests as f64
        }
    }
}

/// 翻译记忆
pub struct TranslationMemory {
    entries: Option<LruCache<(String, String), String>>,
    stats: CacheStats,
}

impl Default for TranslationMemory {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl TranslationMemory {
    pub fn new(config: CacheConfig) -> Self {
        let entries = if config.enabled {
            NonZeroUsize::new(config.max_size).map(LruCache::new)
        } else {
            None
        };
        if entries.is_none() {
            tracing::debug!("翻译缓存已禁用");
        }

        Self {
            entries,
            stats: CacheStats::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    /// 查询译文，`normalized` 应是归一化后的原文
    pub fn get(&mut self, target_lang: &str, normalized: &str) -> Option<String> {
        let entries = self.entries.as_mut()?;
        self.stats.total_requests += 1;

        let key = (target_lang.to_string(), normalized.to_string());
        match entries.get(&key) {
            Some(translated) => {
                self.stats.cache_hits += 1;
                Some(translated.clone())
            }
            None => {
                self.stats.cache_misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, target_lang: &str, normalized: &str, translated: String) {
        let Some(entries) = self.entries.as_mut() else {
            return;
        };
        let key = (target_lang.to_string(), normalized.to_string());
        if let Some((evicted, _)) = entries.push(key.clone(), translated) {
            if evicted != key {
                self.stats.evictions += 1;
            }
        }
        self.stats.total_entries = entries.len();
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map(LruCache::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        if let Some(entries) = self.entries.as_mut() {
            entries.clear();
        }
        self.stats.total_entries = 0;
    }

    pub fn get_stats(&self) -> CacheStats {
        self.stats
    }
}
