//! 元素排除规则与文本归一化
//!
//! 决定哪些元素之下的文本永远不进入批次：机器可读内容、显式标记跳过的元素，
//! 以及已经被翻译成当前目标语言的元素。

use std::collections::HashSet;

use markup5ever_rcdom::Handle;

use crate::parsers::html::{get_node_attr, get_node_name, has_class};
use crate::translation::config::{constants, TranslationConfig};

/// 元素被排除的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exclusion {
    /// script/style/code/pre 等容器
    Container,
    /// `data-no-translate`、`translate="no"` 或 `notranslate` 类
    SkipFlag,
    /// 已被标记为当前目标语言
    AlreadyTranslated,
}

/// 节点过滤器
#[derive(Debug, Clone)]
pub struct NodeFilter {
    skip_elements: HashSet<String>,
    skip_attr: String,
    translated_attr: String,
}

impl Default for NodeFilter {
    fn default() -> Self {
        Self::new(constants::SKIP_ATTR, constants::TRANSLATED_ATTR)
    }
}

impl NodeFilter {
    pub fn new(skip_attr: &str, translated_attr: &str) -> Self {
        Self {
            skip_elements: constants::SKIP_ELEMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            skip_attr: skip_attr.to_string(),
            translated_attr: translated_attr.to_string(),
        }
    }

    pub fn from_config(config: &TranslationConfig) -> Self {
        Self::new(&config.skip_attr, &config.translated_attr)
    }

    pub fn translated_attr(&self) -> &str {
        &self.translated_attr
    }

    /// 整棵子树都不参与翻译的元素
    pub fn subtree_exclusion(&self, element: &Handle) -> Option<Exclusion> {
        if let Some(tag) = get_node_name(element) {
            if self.skip_elements.contains(&tag.to_ascii_lowercase()) {
                return Some(Exclusion::Container);
            }
        }

        let translate_no = get_node_attr(element, "translate")
            .map(|v| v.trim().eq_ignore_ascii_case("no"))
            .unwrap_or(false);
        if translate_no
            || get_node_attr(element, &self.skip_attr).is_some()
            || has_class(element, constants::SKIP_CLASS)
        {
            return Some(Exclusion::SkipFlag);
        }

        None
    }

    /// 文本节点的直接父元素是否已是目标语言
    ///
    /// 标记只对直接子文本生效，后来插入到深层的内容仍会被发现。
    pub fn is_translated_into(&self, element: &Handle, target_lang: &str) -> bool {
        get_node_attr(element, &self.translated_attr)
            .map(|lang| lang.eq_ignore_ascii_case(target_lang))
            .unwrap_or(false)
    }

    /// 属性变化是否可能让新文本变得可见
    pub fn is_visibility_attr(&self, name: &str) -> bool {
        name != self.translated_attr && constants::VISIBILITY_ATTRS.contains(&name)
    }
}

/// 折叠连续空白为单个空格并去掉首尾空白
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 去掉首尾空白后是否为空
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// 把译文放回原文的首尾空白之间
pub fn wrap_like_original(original: &str, translated: &str) -> String {
    let trimmed_start = original.trim_start();
    let leading = &original[..original.len() - trimmed_start.len()];
    let trailing = &trimmed_start[trimmed_start.trim_end().len()..];
    format!("{}{}{}", leading, translated.trim(), trailing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::create_element_node;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  Welcome \n\t home  "), "Welcome home");
        assert_eq!(normalize_whitespace("\u{a0}x\u{a0}"), "x");
        assert_eq!(normalize_whitespace("   "), "");
    }

    #[test]
    fn test_wrap_like_original() {
        assert_eq!(wrap_like_original("\n  Hello  ", "Bonjour"), "\n  Bonjour  ");
        assert_eq!(wrap_like_original("Hello", " Bonjour "), "Bonjour");
        assert_eq!(wrap_like_original("   ", "x"), "   x");
    }

    #[test]
    fn test_subtree_exclusions() {
        let filter = NodeFilter::default();

        let code = create_element_node("code", &[]);
        assert_eq!(filter.subtree_exclusion(&code), Some(Exclusion::Container));

        let flagged = create_element_node("span", &[("data-no-translate", "")]);
        assert_eq!(filter.subtree_exclusion(&flagged), Some(Exclusion::SkipFlag));

        let translate_no = create_element_node("span", &[("translate", "NO")]);
        assert_eq!(filter.subtree_exclusion(&translate_no), Some(Exclusion::SkipFlag));

        let class = create_element_node("button", &[("class", "btn notranslate")]);
        assert_eq!(filter.subtree_exclusion(&class), Some(Exclusion::SkipFlag));

        let plain = create_element_node("p", &[("class", "lead")]);
        assert_eq!(filter.subtree_exclusion(&plain), None);
    }

    #[test]
    fn test_translated_marker_is_language_specific() {
        let filter = NodeFilter::default();
        let p = create_element_node("p", &[("data-translated", "fr")]);

        assert!(filter.is_translated_into(&p, "fr"));
        assert!(!filter.is_translated_into(&p, "de"));
    }

    #[test]
    fn test_visibility_attrs() {
        let filter = NodeFilter::default();
        assert!(filter.is_visibility_attr("style"));
        assert!(filter.is_visibility_attr("hidden"));
        assert!(!filter.is_visibility_attr("data-translated"));
        assert!(!filter.is_visibility_attr("href"));
    }
}
