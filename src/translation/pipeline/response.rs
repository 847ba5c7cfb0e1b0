//! 模型输出的容错解码
//!
//! 远端服务生成的是自由文本，期望是 JSON 字符串数组，但常见几种偏差：
//! 包在代码围栏里、前后夹带说明文字、甚至不是合法 JSON。按以下顺序逐级尝试：
//!
//! 1. 直接解析
//! 2. 去掉代码围栏后解析
//! 3. 截取第一个 `[` 到最后一个 `]` 之间的内容解析
//! 4. 抓取所有双引号字符串
//!
//! 全部失败时返回 `ParseError`，由调用方决定重试或原文直出。

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::translation::error::{helpers::parse_error, TranslationResult};

/// 成功解码所用的策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeStrategy {
    Strict,
    Fenced,
    BracketSlice,
    QuotedScrape,
}

/// 解码结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub items: Vec<String>,
    pub strategy: DecodeStrategy,
}

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)```[A-Za-z0-9_-]*\s*(.*?)\s*```").expect("fence pattern is valid")
    })
}

fn quoted_regex() -> &'static Regex {
    static QUOTED: OnceLock<Regex> = OnceLock::new();
    QUOTED.get_or_init(|| {
        Regex::new(r#""((?:[^"\\]|\\.)*)""#).expect("quoted-string pattern is valid")
    })
}

/// 把文本负载解码为字符串列表
pub fn decode_string_list(payload: &str) -> TranslationResult<Decoded> {
    let payload = payload.trim();

    if let Some(items) = parse_json_list(payload) {
        return Ok(Decoded {
            items,
            strategy: DecodeStrategy::Strict,
        });
    }

    if let Some(items) = fence_regex()
        .captures(payload)
        .and_then(|caps| caps.get(1))
        .and_then(|body| parse_json_list(body.as_str()))
    {
        return Ok(Decoded {
            items,
            strategy: DecodeStrategy::Fenced,
        });
    }

    let sliced = bracket_slice(payload);
    if let Some(items) = sliced.and_then(parse_json_list) {
        return Ok(Decoded {
            items,
            strategy: DecodeStrategy::BracketSlice,
        });
    }

    let items = scrape_quoted(sliced.unwrap_or(payload));
    if !items.is_empty() {
        return Ok(Decoded {
            items,
            strategy: DecodeStrategy::QuotedScrape,
        });
    }

    Err(parse_error(format!(
        "无法从响应中解析字符串数组: {}",
        preview(payload)
    )))
}

/// 严格解析 JSON 数组，标量元素转为字符串，嵌套结构或 null 视为失败
fn parse_json_list(text: &str) -> Option<Vec<String>> {
    let values: Vec<Value> = serde_json::from_str(text.trim()).ok()?;
    values
        .into_iter()
        .map(|value| match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
        .collect()
}

fn bracket_slice(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (start < end).then(|| &text[start..=end])
}

fn scrape_quoted(text: &str) -> Vec<String> {
    quoted_regex()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|body| {
            let raw = body.as_str();
            serde_json::from_str::<String>(&format!("\"{}\"", raw)).unwrap_or_else(|_| raw.to_string())
        })
        .collect()
}

fn preview(text: &str) -> String {
    const LIMIT: usize = 120;
    if text.chars().count() <= LIMIT {
        text.to_string()
    } else {
        format!("{}…", text.chars().take(LIMIT).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_json() {
        let decoded = decode_string_list(r#"["Bonjour", "Au revoir"]"#).unwrap();
        assert_eq!(decoded.items, vec!["Bonjour", "Au revoir"]);
        assert_eq!(decoded.strategy, DecodeStrategy::Strict);
    }

    #[test]
    fn test_fenced_json() {
        let decoded = decode_string_list("```json\n[\"Hallo\", \"Welt\"]\n```").unwrap();
        assert_eq!(decoded.items, vec!["Hallo", "Welt"]);
        assert_eq!(decoded.strategy, DecodeStrategy::Fenced);
    }

    #[test]
    fn test_json_embedded_in_prose() {
        let decoded =
            decode_string_list("Sure! Here is the translation: [\"Hola\", \"Adiós\"] Hope it helps.")
                .unwrap();
        assert_eq!(decoded.items, vec!["Hola", "Adiós"]);
        assert_eq!(decoded.strategy, DecodeStrategy::BracketSlice);
    }

    #[test]
    fn test_quoted_scrape_as_last_resort() {
        // 末尾多余的逗号使 JSON 非法
        let decoded = decode_string_list("[\"Ciao\", \"a \\\"tutti\\\"\",]").unwrap();
        assert_eq!(decoded.items, vec!["Ciao", "a \"tutti\""]);
        assert_eq!(decoded.strategy, DecodeStrategy::QuotedScrape);
    }

    #[test]
    fn test_scalars_are_stringified() {
        let decoded = decode_string_list("[\"Page\", 2, true]").unwrap();
        assert_eq!(decoded.items, vec!["Page", "2", "true"]);
    }

    #[test]
    fn test_give_up() {
        assert!(decode_string_list("I cannot translate this.").is_err());
        assert!(decode_string_list("").is_err());
    }
}
