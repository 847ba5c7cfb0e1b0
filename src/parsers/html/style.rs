//! 基于标记的可见性推断
//!
//! 没有样式引擎时，"计算样式"只能从内联 `style`（经 cssparser 分词）与 `hidden` 属性推出：
//! `display: none` 作用于整个子树，`visibility` 可被后代重新声明。

use cssparser::{Delimiter, ParseError, Parser, ParserInput, ToCss, Token};
use markup5ever_rcdom::Handle;

use super::dom::get_node_attr;

/// 从外到内累积的可见性状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Visibility {
    display_none: bool,
    visibility_hidden: bool,
}

impl Visibility {
    /// 进入一个元素后的可见性
    pub fn descend(self, element: &Handle) -> Self {
        let mut next = self;

        if get_node_attr(element, "hidden").is_some() {
            next.display_none = true;
        }

        if let Some(style) = get_node_attr(element, "style") {
            for (property, value) in parse_inline_style(&style) {
                match property.as_str() {
                    "display" if value == "none" => next.display_none = true,
                    "visibility" => match value.as_str() {
                        "hidden" | "collapse" => next.visibility_hidden = true,
                        "visible" => next.visibility_hidden = false,
                        _ => {}
                    },
                    _ => {}
                }
            }
        }

        next
    }

    /// 由外到内依次进入一串元素
    pub fn through<'a, I>(elements: I) -> Self
    where
        I: IntoIterator<Item = &'a Handle>,
    {
        elements
            .into_iter()
            .fold(Self::default(), |state, element| state.descend(element))
    }

    pub fn is_visible(&self) -> bool {
        !self.display_none && !self.visibility_hidden
    }

    /// `display: none` 之下不可能再出现可见内容，可以剪枝
    pub fn prunes_subtree(&self) -> bool {
        self.display_none
    }
}

/// 解析内联样式声明，属性名与值均转为小写，去掉 `!important`
///
/// 用 cssparser 分词，注释被跳过，引号内的 `;` 不会截断声明；无法解析的声明整条丢弃。
pub fn parse_inline_style(style: &str) -> Vec<(String, String)> {
    let mut input = ParserInput::new(style);
    let mut parser = Parser::new(&mut input);
    let mut declarations = Vec::new();

    while !parser.is_exhausted() {
        if let Ok(declaration) = parser.parse_until_after(Delimiter::Semicolon, parse_declaration) {
            declarations.push(declaration);
        }
    }

    declarations
}

/// `property: value [!important]`
fn parse_declaration<'i>(parser: &mut Parser<'i, '_>) -> Result<(String, String), ParseError<'i, ()>> {
    let property = parser.expect_ident()?.to_ascii_lowercase();
    parser.expect_colon()?;

    let mut parts = Vec::new();
    let mut important = false;
    while let Ok(token) = parser.next() {
        if important {
            continue;
        }
        match token {
            Token::Delim('!') => important = true,
            Token::Ident(value) => parts.push(value.to_ascii_lowercase()),
            other => parts.push(other.to_css_string()),
        }
    }

    Ok((property, parts.join(" ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::dom::create_element_node;

    #[test]
    fn test_parse_inline_style() {
        let parsed = parse_inline_style("color: red; DISPLAY : None !important;;");
        assert_eq!(
            parsed,
            vec![
                ("color".to_string(), "red".to_string()),
                ("display".to_string(), "none".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_inline_style_skips_comments() {
        let parsed = parse_inline_style("color:red; /* menu */ display:none");
        assert_eq!(
            parsed,
            vec![
                ("color".to_string(), "red".to_string()),
                ("display".to_string(), "none".to_string()),
            ]
        );
    }

    #[test]
    fn test_quoted_semicolon_does_not_split_declaration() {
        let parsed = parse_inline_style(r#"font-family: "a;display:none"; visibility: hidden"#);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].0, "font-family");
        assert_eq!(parsed[1], ("visibility".to_string(), "hidden".to_string()));
        assert!(!parsed.iter().any(|(property, _)| property == "display"));
    }

    #[test]
    fn test_malformed_declaration_is_dropped() {
        let parsed = parse_inline_style("12px; : none; display: none");
        assert_eq!(parsed, vec![("display".to_string(), "none".to_string())]);
    }

    #[test]
    fn test_commented_display_none_hides_element() {
        let element = create_element_node("div", &[("style", "color:red; /* menu */ display:none")]);
        let state = Visibility::default().descend(&element);
        assert!(!state.is_visible());
        assert!(state.prunes_subtree());
    }

    #[test]
    fn test_visibility_can_be_redeclared() {
        let outer = create_element_node("div", &[("style", "visibility:hidden")]);
        let inner = create_element_node("span", &[("style", "visibility: visible")]);

        let state = Visibility::default().descend(&outer);
        assert!(!state.is_visible());
        assert!(!state.prunes_subtree());
        assert!(state.descend(&inner).is_visible());
    }

    #[test]
    fn test_display_none_cannot_be_undone() {
        let outer = create_element_node("div", &[("hidden", "")]);
        let inner = create_element_node("span", &[("style", "display:block")]);

        let state = Visibility::through([&outer, &inner]);
        assert!(!state.is_visible());
        assert!(state.prunes_subtree());
    }
}
