//! 分块远程翻译
//!
//! 把去重后的文本切成不超过 `chunk_size` 的块，逐块串行请求，块与块之间等待
//! `chunk_delay`。每块独立失败：网络错误、超时直接原文直出，响应无法解码或条数
//! 不符时用严格模式重试一次，仍不行再原文直出。整个过程从不向上返回错误。

use std::time::Duration;

use tokio::time::{sleep, timeout};

use super::response::{decode_string_list, DecodeStrategy};
use crate::translation::backend::{CompletionBackend, CompletionRequest, PromptMode};
use crate::translation::config::{constants, TranslationConfig};
use crate::translation::error::{helpers, TranslationError, TranslationResult};

/// 分块配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    pub chunk_size: usize,
    pub chunk_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: constants::DEFAULT_CHUNK_SIZE,
            chunk_delay: constants::DEFAULT_CHUNK_DELAY,
            request_timeout: constants::DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl From<&TranslationConfig> for BatchConfig {
    fn from(config: &TranslationConfig) -> Self {
        Self {
            chunk_size: config.chunk_size.max(1),
            chunk_delay: config.chunk_delay(),
            request_timeout: config.request_timeout(),
        }
    }
}

/// 分块统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub chunks: usize,
    pub requests: usize,
    pub strict_retries: usize,
    pub failed_chunks: usize,
    pub passthrough_strings: usize,
}

/// 与输入逐位置对齐的翻译结果
#[derive(Debug, Clone, Default)]
pub struct BatchOutput {
    pub translations: Vec<String>,
    /// 为 `true` 的位置是原文直出
    pub passthrough: Vec<bool>,
    pub stats: BatchStats,
}

impl BatchOutput {
    pub fn len(&self) -> usize {
        self.translations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }
}

/// 分块翻译器
pub struct BatchTranslator<'a, B: ?Sized> {
    backend: &'a B,
    config: BatchConfig,
}

impl<'a, B: CompletionBackend + ?Sized> BatchTranslator<'a, B> {
    pub fn new(backend: &'a B, config: BatchConfig) -> Self {
        Self { backend, config }
    }

    /// 翻译全部文本，结果长度总是等于输入长度
    pub async fn translate(&self, texts: &[String], target_lang: &str) -> BatchOutput {
        let mut output = BatchOutput {
            translations: Vec::with_capacity(texts.len()),
            passthrough: Vec::with_capacity(texts.len()),
            stats: BatchStats::default(),
        };

        let chunks: Vec<&[String]> = texts.chunks(self.config.chunk_size.max(1)).collect();
        output.stats.chunks = chunks.len();

        for (index, chunk) in chunks.iter().enumerate() {
            match self.translate_chunk(chunk, target_lang, index, &mut output.stats).await {
                Some(translated) => {
                    output.translations.extend(translated);
                    output.passthrough.extend(std::iter::repeat(false).take(chunk.len()));
                }
                None => {
                    output.stats.failed_chunks += 1;
                    output.stats.passthrough_strings += chunk.len();
                    output.translations.extend(chunk.iter().cloned());
                    output.passthrough.extend(std::iter::repeat(true).take(chunk.len()));
                }
            }

            if index + 1 < chunks.len() && !self.config.chunk_delay.is_zero() {
                sleep(self.config.chunk_delay).await;
            }
        }

        output
    }

    /// 翻译单个块，`None` 表示该块原文直出
    ///
    /// 是否以严格模式再试一次由错误本身决定（`TranslationError::is_retryable`）。
    async fn translate_chunk(
        &self,
        chunk: &[String],
        target_lang: &str,
        index: usize,
        stats: &mut BatchStats,
    ) -> Option<Vec<String>> {
        let mut mode = PromptMode::Normal;
        loop {
            let attempt = match self.request(chunk, target_lang, mode, stats).await {
                Ok(payload) => Self::accept(&payload, chunk.len()),
                Err(e) => Err(e),
            };

            match attempt {
                Ok(items) => return Some(items),
                Err(e) if mode == PromptMode::Normal && e.is_retryable() => {
                    tracing::debug!("第 {} 块首次响应不可用，严格模式重试: {}", index + 1, e);
                    stats.strict_retries += 1;
                    mode = PromptMode::Strict;
                }
                Err(e) => {
                    let context = match mode {
                        PromptMode::Normal => format!("第 {} 块", index + 1),
                        PromptMode::Strict => format!("第 {} 块重试", index + 1),
                    };
                    helpers::log_error(&e.with_context(context), "翻译失败，原文直出");
                    return None;
                }
            }
        }
    }

    async fn request(
        &self,
        chunk: &[String],
        target_lang: &str,
        mode: PromptMode,
        stats: &mut BatchStats,
    ) -> TranslationResult<String> {
        let request = CompletionRequest::new(chunk, target_lang, mode)?;
        stats.requests += 1;
        timeout(self.config.request_timeout, self.backend.complete(&request)).await?
    }

    /// 解码负载并检查条数
    fn accept(payload: &str, expected: usize) -> TranslationResult<Vec<String>> {
        let decoded = decode_string_list(payload)?;
        if decoded.strategy != DecodeStrategy::Strict {
            tracing::debug!("响应经 {:?} 策略解码", decoded.strategy);
        }
        if decoded.items.len() != expected {
            return Err(TranslationError::ParseError(format!(
                "条数不符: 期望 {}，实际 {}",
                expected,
                decoded.items.len()
            )));
        }
        Ok(decoded.items)
    }
}
