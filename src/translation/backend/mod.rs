//! 远端翻译服务接口
//!
//! 同步器只依赖 [`CompletionBackend`]：给出一段提示词，拿回模型的文本负载。
//! 解析与重试在管道层完成，后端只负责一次请求。

pub mod http;
pub mod prompt;

use std::rc::Rc;

pub use http::HttpCompletionBackend;
pub use prompt::{language_name, PromptMode};

use crate::translation::error::TranslationResult;

/// 一次补全请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub target_lang: String,
    /// 待翻译的原文，按顺序
    pub texts: Vec<String>,
    pub mode: PromptMode,
    pub system: String,
    pub prompt: String,
}

impl CompletionRequest {
    pub fn new(texts: &[String], target_lang: &str, mode: PromptMode) -> TranslationResult<Self> {
        Ok(Self {
            target_lang: target_lang.to_string(),
            texts: texts.to_vec(),
            mode,
            system: prompt::SYSTEM_PROMPT.to_string(),
            prompt: prompt::build_user_prompt(texts, target_lang, mode)?,
        })
    }
}

/// 文本补全后端
#[allow(async_fn_in_trait)]
pub trait CompletionBackend {
    /// 发送请求并返回模型输出的文本负载
    async fn complete(&self, request: &CompletionRequest) -> TranslationResult<String>;
}

impl<T: CompletionBackend + ?Sized> CompletionBackend for Rc<T> {
    async fn complete(&self, request: &CompletionRequest) -> TranslationResult<String> {
        (**self).complete(request).await
    }
}

impl<T: CompletionBackend + ?Sized> CompletionBackend for &T {
    async fn complete(&self, request: &CompletionRequest) -> TranslationResult<String> {
        (**self).complete(request).await
    }
}
