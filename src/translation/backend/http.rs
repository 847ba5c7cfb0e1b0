//! 基于 HTTP 的补全后端
//!
//! 请求体采用 OpenAI 兼容的 chat-completions 格式；响应中的文本负载依次从
//! `choices[0].message.content`、`candidates[0].content.parts[0].text`、
//! `output_text` 中读取，覆盖常见的托管模型网关。

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;

use super::{CompletionBackend, CompletionRequest};
use crate::translation::config::TranslationConfig;
use crate::translation::error::{helpers, TranslationError, TranslationResult};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

/// HTTP 补全后端
#[derive(Debug, Clone)]
pub struct HttpCompletionBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl HttpCompletionBackend {
    pub fn new(config: &TranslationConfig) -> TranslationResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| helpers::config_error(format!("创建HTTP客户端失败: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

impl CompletionBackend for HttpCompletionBackend {
    async fn complete(&self, request: &CompletionRequest) -> TranslationResult<String> {
        let body = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
        };

        let mut builder = self.client.post(&self.api_url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        tracing::debug!(
            "发送翻译请求: {} 条文本 → {} ({:?})",
            request.texts.len(),
            request.target_lang,
            request.mode
        );

        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TranslationError::RateLimitExceeded);
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(helpers::network_error(format!(
                "HTTP {}: {}",
                status,
                detail.chars().take(200).collect::<String>()
            )));
        }

        let value: Value = response.json().await?;
        extract_text_payload(&value)
            .ok_or_else(|| helpers::parse_error("响应中没有文本负载"))
    }
}

/// 从服务响应中取出模型输出的文本
pub fn extract_text_payload(value: &Value) -> Option<String> {
    let candidates = [
        value.pointer("/choices/0/message/content"),
        value.pointer("/choices/0/text"),
        value.pointer("/candidates/0/content/parts/0/text"),
        value.get("output_text"),
    ];

    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_openai_shape() {
        let value = json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "[\"Hola\"]"}}]
        });
        assert_eq!(extract_text_payload(&value).as_deref(), Some("[\"Hola\"]"));
    }

    #[test]
    fn test_extract_gemini_shape() {
        let value = json!({
            "candidates": [{"content": {"parts": [{"text": "[\"Salut\"]"}]}}]
        });
        assert_eq!(extract_text_payload(&value).as_deref(), Some("[\"Salut\"]"));
    }

    #[test]
    fn test_extract_missing_payload() {
        assert_eq!(extract_text_payload(&json!({"error": "quota"})), None);
    }

    #[test]
    fn test_backend_from_config() {
        let config = TranslationConfig {
            target_lang: "fr".to_string(),
            api_url: "http://127.0.0.1:9/v1/chat".to_string(),
            ..TranslationConfig::default()
        };
        let backend = HttpCompletionBackend::new(&config).unwrap();
        assert_eq!(backend.api_url(), "http://127.0.0.1:9/v1/chat");
    }
}
