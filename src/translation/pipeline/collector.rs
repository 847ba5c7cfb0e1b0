//! 可见文本发现
//!
//! 从给定根节点按文档顺序收集可以翻译的文本节点。收集过程只读，不修改任何节点。

use markup5ever_rcdom::{Handle, NodeData};

use super::filters::{is_blank, Exclusion, NodeFilter};
use crate::parsers::html::{element_ancestors, get_parent_node, Visibility};

/// 文本收集器
pub struct TextCollector {
    filter: NodeFilter,
    stats: CollectionStats,
}

impl TextCollector {
    /// 创建新的文本收集器
    pub fn new(filter: NodeFilter) -> Self {
        Self {
            filter,
            stats: CollectionStats::default(),
        }
    }

    pub fn filter(&self) -> &NodeFilter {
        &self.filter
    }

    /// 收集 `root` 之下需要翻译成 `target_lang` 的文本节点
    ///
    /// 返回值是有限、可重复遍历的列表而不是流。根节点之上的祖先同样参与
    /// 排除与可见性判断。
    pub fn collect_translatable_texts(&mut self, root: &Handle, target_lang: &str) -> Vec<Handle> {
        self.stats.reset();
        let mut texts = Vec::new();

        let ancestors = element_ancestors(root);
        if let Some(exclusion) = ancestors
            .iter()
            .find_map(|element| self.filter.subtree_exclusion(element))
        {
            self.stats.record_exclusion(exclusion);
            return texts;
        }

        let visibility = Visibility::through(ancestors.iter());
        if visibility.prunes_subtree() {
            self.stats.hidden_elements += 1;
            return texts;
        }

        self.collect_recursive(root, visibility, target_lang, &mut texts);
        self.stats.final_text_count = texts.len();

        tracing::debug!(
            "文本收集完成: 访问 {} 个节点, 收集 {} 段文本",
            self.stats.nodes_visited,
            texts.len()
        );

        texts
    }

    /// 递归收集文本
    fn collect_recursive(
        &mut self,
        node: &Handle,
        visibility: Visibility,
        target_lang: &str,
        texts: &mut Vec<Handle>,
    ) {
        self.stats.nodes_visited += 1;

        match node.data {
            NodeData::Text { ref contents } => {
                self.stats.text_nodes_found += 1;

                if !visibility.is_visible() {
                    self.stats.hidden_texts += 1;
                    return;
                }
                if is_blank(&contents.borrow()) {
                    self.stats.blank_texts += 1;
                    return;
                }
                let already_translated = get_parent_node(node)
                    .map(|parent| self.filter.is_translated_into(&parent, target_lang))
                    .unwrap_or(false);
                if already_translated {
                    self.stats.record_exclusion(Exclusion::AlreadyTranslated);
                    return;
                }

                texts.push(node.clone());
            }
            NodeData::Element { .. } => {
                if let Some(exclusion) = self.filter.subtree_exclusion(node) {
                    self.stats.record_exclusion(exclusion);
                    return;
                }

                let visibility = visibility.descend(node);
                if visibility.prunes_subtree() {
                    self.stats.hidden_elements += 1;
                    return;
                }

                for child in node.children.borrow().iter() {
                    self.collect_recursive(child, visibility, target_lang, texts);
                }
            }
            _ => {
                for child in node.children.borrow().iter() {
                    self.collect_recursive(child, visibility, target_lang, texts);
                }
            }
        }
    }

    /// 获取收集统计信息
    pub fn get_stats(&self) -> &CollectionStats {
        &self.stats
    }
}

/// 收集统计信息
#[derive(Debug, Clone, Default)]
pub struct CollectionStats {
    pub nodes_visited: usize,
    pub text_nodes_found: usize,
    pub blank_texts: usize,
    pub hidden_texts: usize,
    pub hidden_elements: usize,
    pub skipped_containers: usize,
    pub skipped_flagged: usize,
    pub skipped_translated: usize,
    pub final_text_count: usize,
}

impl CollectionStats {
    /// 重置统计
    pub fn reset(&mut self) {
        *self = Default::default();
    }

    fn record_exclusion(&mut self, exclusion: Exclusion) {
        match exclusion {
            Exclusion::Container => self.skipped_containers += 1,
            Exclusion::SkipFlag => self.skipped_flagged += 1,
            Exclusion::AlreadyTranslated => self.skipped_translated += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::{find_first_element, html_to_dom, text_content};

    fn collect(html: &str, lang: &str) -> Vec<String> {
        let dom = html_to_dom(html.as_bytes(), "utf-8").unwrap();
        let mut collector = TextCollector::new(NodeFilter::default());
        collector
            .collect_translatable_texts(&dom.document, lang)
            .iter()
            .filter_map(text_content)
            .map(|t| t.trim().to_string())
            .collect()
    }

    #[test]
    fn test_document_order_and_containers() {
        let texts = collect(
            "<body><h1>Title</h1><script>var x = 1;</script>\
             <p>First <b>bold</b></p><pre>raw</pre><code>fn()</code><p>Last</p></body>",
            "fr",
        );
        assert_eq!(texts, vec!["Title", "First", "bold", "Last"]);
    }

    #[test]
    fn test_hidden_and_flagged_content_is_skipped() {
        let texts = collect(
            "<body><p style='display:none'>Hidden</p>\
             <div style='visibility:hidden'>Ghost <span style='visibility:visible'>Shown</span></div>\
             <nav data-no-translate><a>Settings</a></nav>\
             <p hidden>Also hidden</p><p>Visible</p></body>",
            "fr",
        );
        assert_eq!(texts, vec!["Shown", "Visible"]);
    }

    #[test]
    fn test_translated_marker_only_matches_target_language() {
        let html = "<body><p data-translated='fr'>Bonjour</p><p>Hello</p></body>";
        assert_eq!(collect(html, "fr"), vec!["Hello"]);
        assert_eq!(collect(html, "de"), vec!["Bonjour", "Hello"]);
    }

    #[test]
    fn test_root_inside_excluded_ancestor_yields_nothing() {
        let dom = html_to_dom(
            b"<body><div class='notranslate'><p>Inner</p></div></body>",
            "utf-8",
        )
        .unwrap();
        let p = find_first_element(&dom.document, "p").unwrap();
        let mut collector = TextCollector::new(NodeFilter::default());

        assert!(collector.collect_translatable_texts(&p, "fr").is_empty());
        assert_eq!(collector.get_stats().skipped_flagged, 1);
    }

    #[test]
    fn test_collection_is_read_only_and_restartable() {
        let dom = html_to_dom(b"<p>One</p><p>Two</p>", "utf-8").unwrap();
        let mut collector = TextCollector::new(NodeFilter::default());

        let first = collector.collect_translatable_texts(&dom.document, "fr");
        let second = collector.collect_translatable_texts(&dom.document, "fr");
        assert_eq!(first.len(), 2);
        assert_eq!(first.len(), second.len());
        assert!(first
            .iter()
            .zip(second.iter())
            .all(|(a, b)| std::rc::Rc::ptr_eq(a, b)));
    }
}
