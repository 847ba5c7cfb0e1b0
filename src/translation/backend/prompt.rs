//! 翻译提示词构造

use crate::translation::error::TranslationResult;

/// 请求模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptMode {
    /// 首次请求
    Normal,
    /// 长度不符或无法解析后的重试，要求严格等长
    Strict,
}

/// 常见语言代码到英文名称的映射，未知代码原样使用
pub fn language_name(code: &str) -> &str {
    let primary = code.split(['-', '_']).next().unwrap_or(code);
    match primary.to_ascii_lowercase().as_str() {
        "ar" => "Arabic",
        "bn" => "Bengali",
        "de" => "German",
        "en" => "English",
        "es" => "Spanish",
        "fa" => "Persian",
        "fr" => "French",
        "hi" => "Hindi",
        "id" => "Indonesian",
        "it" => "Italian",
        "ja" => "Japanese",
        "ko" => "Korean",
        "mr" => "Marathi",
        "nl" => "Dutch",
        "pl" => "Polish",
        "pt" => "Portuguese",
        "ru" => "Russian",
        "ta" => "Tamil",
        "te" => "Telugu",
        "th" => "Thai",
        "tr" => "Turkish",
        "uk" => "Ukrainian",
        "ur" => "Urdu",
        "vi" => "Vietnamese",
        "zh" => "Chinese",
        _ => code,
    }
}

pub const SYSTEM_PROMPT: &str = "You are a professional translation engine for website text. \
You reply with JSON only.";

/// 构造用户提示词，负载以 JSON 数组嵌入
pub fn build_user_prompt(texts: &[String], target_lang: &str, mode: PromptMode) -> TranslationResult<String> {
    let payload = serde_json::to_string(texts)?;
    let language = language_name(target_lang);
    let count = texts.len();

    let prompt = match mode {
        PromptMode::Normal => format!(
            "Translate each string in the following JSON array into {language}. \
Preserve the order, punctuation, numbers, emoji and proper nouns. \
Return only a JSON array of {count} strings, one translation per input string.\n\n{payload}"
        ),
        PromptMode::Strict => format!(
            "Your previous answer could not be used. Translate each string in the following \
JSON array into {language}. The answer MUST be a single JSON array containing EXACTLY {count} \
strings, in the same order as the input. Do not merge, split, skip or explain entries. \
Do not use code fences. Output the JSON array and nothing else.\n\n{payload}"
        ),
    };

    Ok(prompt)
}
