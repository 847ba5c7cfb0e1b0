//! 增量 DOM 翻译同步器
//!
//! 一个实例对应一棵文档树。所有入口都接受 `&self`，可以被多个本地任务同时调用：
//! 任意时刻至多一轮在执行，运行中到达的请求只留下"还欠一轮"的标记，结束后按
//! 最新选择的语言补跑一次。
//!
//! ```text
//! Idle --request--> Running --request--> RunningWithPendingRerun
//!   ^                  |                          |
//!   +----complete------+      complete: 再跑一轮 --+
//! ```
//!
//! 状态放在 `Cell`/`RefCell` 中，借用从不跨越 `.await`。

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use markup5ever_rcdom::{Handle, NodeData};

use super::events::{Mutation, SyncEvent};
use super::stats::SyncStats;
use crate::parsers::html::{get_node_attr, get_parent_node, is_attached, set_node_attr, set_text_content, text_content};
use crate::translation::backend::CompletionBackend;
use crate::translation::config::TranslationConfig;
use crate::translation::error::helpers;
use crate::translation::pipeline::{
    is_blank, wrap_like_original, BatchConfig, BatchTranslator, CycleBatch, NodeFilter, SnapshotStore,
    TextCollector,
};
use crate::translation::storage::{
    CacheConfig, CacheStats, FilePreferenceStore, MemoryPreferenceStore, PreferenceStore, TranslationMemory,
};

/// 同步器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Running,
    RunningWithPendingRerun,
}

/// 一次请求的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// 本次调用亲自执行了若干轮（含还原与补跑）
    Completed { cycles: usize },
    /// 已有一轮在执行，请求被合并进尾随轮
    Coalesced,
    /// 无需执行（源语言下的变化通知、无关的 DOM 变化等）
    Skipped,
}

/// 运行标记的守卫，请求 future 被丢弃时同样复位
struct RunningGuard<'a> {
    running: &'a Cell<bool>,
    pending: &'a Cell<bool>,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.running.set(false);
        self.pending.set(false);
    }
}

/// 翻译同步器
pub struct Synchronizer<B> {
    root: Handle,
    backend: B,
    config: TranslationConfig,
    batch_config: BatchConfig,
    collector: RefCell<TextCollector>,
    snapshots: RefCell<SnapshotStore>,
    memory: RefCell<TranslationMemory>,
    preferences: Box<dyn PreferenceStore>,
    selected: RefCell<String>,
    running: Cell<bool>,
    pending: Cell<bool>,
    stats: RefCell<SyncStats>,
}

impl<B: CompletionBackend> Synchronizer<B> {
    /// 创建同步器，`root` 通常是 `RcDom::document`
    ///
    /// 配置了 `preference_path` 时语言偏好写入该文件，否则只保存在内存。
    pub fn new(root: Handle, backend: B, config: TranslationConfig) -> Self {
        let preferences: Box<dyn PreferenceStore> = match &config.preference_path {
            Some(path) => Box::new(FilePreferenceStore::new(path)),
            None => Box::new(MemoryPreferenceStore::new()),
        };

        Self {
            batch_config: BatchConfig::from(&config),
            collector: RefCell::new(TextCollector::new(NodeFilter::from_config(&config))),
            snapshots: RefCell::new(SnapshotStore::new()),
            memory: RefCell::new(TranslationMemory::new(CacheConfig::from(&config))),
            preferences,
            selected: RefCell::new(config.source_lang.clone()),
            running: Cell::new(false),
            pending: Cell::new(false),
            stats: RefCell::new(SyncStats::default()),
            root,
            backend,
            config,
        }
    }

    /// 替换语言偏好存储
    pub fn with_preferences(mut self, store: impl PreferenceStore + 'static) -> Self {
        self.preferences = Box::new(store);
        self
    }

    // ------------------------------------------------------------------
    // 入口
    // ------------------------------------------------------------------

    /// 用户选择语言。选择源语言等同于还原。
    pub async fn request_translation(&self, lang: &str) -> RequestOutcome {
        let lang = lang.trim();
        let lang = if lang.is_empty() {
            self.config.source_lang.clone()
        } else {
            lang.to_string()
        };

        if let Err(e) = self.preferences.save(&lang) {
            helpers::log_error(&e, "保存语言偏好失败");
        }
        *self.selected.borrow_mut() = lang;

        self.drive().await
    }

    /// 还原所有跟踪节点的原文
    ///
    /// 运行中调用时，还原在当前轮结束后执行，避免被其写回覆盖。
    pub async fn restore_original(&self) -> RequestOutcome {
        let source = self.config.source_lang.clone();
        self.request_translation(&source).await
    }

    /// 以当前选择的语言重新同步，源语言下什么也不做
    pub async fn refresh(&self) -> RequestOutcome {
        if self.is_source_selected() {
            return RequestOutcome::Skipped;
        }
        self.drive().await
    }

    /// 页面首次加载：按保存的偏好（其次是配置中的目标语言）自动翻译
    pub async fn on_initial_load(&self) -> RequestOutcome {
        let stored = match self.preferences.load() {
            Ok(stored) => stored,
            Err(e) => {
                helpers::log_error(&e, "读取语言偏好失败");
                None
            }
        };
        let configured = Some(self.config.target_lang.trim().to_string()).filter(|l| !l.is_empty());

        match stored.or(configured) {
            Some(lang) if !self.config.is_source_lang(&lang) => {
                tracing::info!("按已保存的语言偏好自动翻译: {}", lang);
                *self.selected.borrow_mut() = lang;
                self.drive().await
            }
            _ => RequestOutcome::Skipped,
        }
    }

    /// DOM 变化通知，只有可能带来新可见文本的变化才会触发
    pub async fn on_mutations(&self, mutations: &[Mutation]) -> RequestOutcome {
        let relevant = mutations
            .iter()
            .fold(false, |acc, mutation| self.absorb_mutation(mutation) || acc);

        if !relevant || self.is_source_selected() {
            return RequestOutcome::Skipped;
        }
        self.drive().await
    }

    /// 客户端路由切换
    pub async fn on_route_changed(&self, path: &str) -> RequestOutcome {
        tracing::debug!("路由切换: {}", path);
        self.refresh().await
    }

    /// 分发一条来自事件通道的事件
    pub async fn handle_event(&self, event: SyncEvent) -> RequestOutcome {
        match event {
            SyncEvent::LanguageSelected(lang) => self.request_translation(&lang).await,
            SyncEvent::RestoreOriginal => self.restore_original().await,
            SyncEvent::DomMutated(mutations) => self.on_mutations(&mutations).await,
            SyncEvent::RouteChanged(path) => self.on_route_changed(&path).await,
        }
    }

    // ------------------------------------------------------------------
    // 状态查询
    // ------------------------------------------------------------------

    /// 当前所处的状态
    pub fn state(&self) -> SyncState {
        match (self.running.get(), self.pending.get()) {
            (false, _) => SyncState::Idle,
            (true, false) => SyncState::Running,
            (true, true) => SyncState::RunningWithPendingRerun,
        }
    }

    /// 当前选择的语言
    pub fn selected_language(&self) -> String {
        self.selected.borrow().clone()
    }

    /// 累计统计的快照
    pub fn stats(&self) -> SyncStats {
        *self.stats.borrow()
    }

    /// 翻译记忆的命中统计
    pub fn cache_stats(&self) -> CacheStats {
        self.memory.borrow().get_stats()
    }

    /// 仍在跟踪的文本节点数
    pub fn tracked_count(&self) -> usize {
        self.snapshots.borrow().len()
    }

    /// 节点记录的原文
    pub fn original_text(&self, node: &Handle) -> Option<String> {
        self.snapshots.borrow().original_of(node).map(str::to_string)
    }

    /// 同步器使用的配置
    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    /// 同步的文档根节点
    pub fn root(&self) -> &Handle {
        &self.root
    }

    // ------------------------------------------------------------------
    // 状态机
    // ------------------------------------------------------------------

    fn is_source_selected(&self) -> bool {
        self.config.is_source_lang(&self.selected.borrow())
    }

    async fn drive(&self) -> RequestOutcome {
        if self.running.get() {
            self.pending.set(true);
            self.stats.borrow_mut().coalesced_requests += 1;
            tracing::debug!("已有翻译在进行，请求合并到下一轮");
            return RequestOutcome::Coalesced;
        }

        self.running.set(true);
        let _guard = RunningGuard {
            running: &self.running,
            pending: &self.pending,
        };

        let mut cycles = 0;
        loop {
            // 补跑使用结束时最新选择的语言
            let lang = self.selected_language();
            if self.config.is_source_lang(&lang) {
                self.restore_all();
            } else {
                self.run_cycle(&lang).await;
            }
            cycles += 1;

            if !self.pending.replace(false) {
                break;
            }
            tracing::debug!("执行被合并的尾随轮");
        }

        RequestOutcome::Completed { cycles }
    }

    /// 一轮完整的 发现 → 快照 → 翻译 → 写回
    async fn run_cycle(&self, lang: &str) {
        let nodes = self
            .collector
            .borrow_mut()
            .collect_translatable_texts(&self.root, lang);

        if nodes.is_empty() {
            tracing::info!("没有需要翻译为 {} 的文本", lang);
            self.stats.borrow_mut().cycles_completed += 1;
            return;
        }

        let batch = {
            let mut snapshots = self.snapshots.borrow_mut();
            let pruned = snapshots.prune();
            if pruned > 0 {
                tracing::debug!("清理了 {} 个已释放节点的快照", pruned);
            }
            snapshots.build_batch(&nodes)
        };
        drop(nodes);

        tracing::info!(
            "开始翻译为 {}: {} 个节点, {} 段唯一文本",
            lang,
            batch.members.len(),
            batch.unique.len()
        );

        // 先查翻译记忆，只请求未命中的部分
        let mut resolved: Vec<Option<String>> = vec![None; batch.unique.len()];
        let mut missing = Vec::new();
        {
            let mut memory = self.memory.borrow_mut();
            for (index, normalized) in batch.unique.iter().enumerate() {
                match memory.get(lang, normalized) {
                    Some(hit) => resolved[index] = Some(hit),
                    None => missing.push(index),
                }
            }
        }
        let hits = batch.unique.len() - missing.len();

        let texts: Vec<String> = missing
            .iter()
            .map(|&index| batch.submission(index).to_string())
            .collect();
        let output = BatchTranslator::new(&self.backend, self.batch_config)
            .translate(&texts, lang)
            .await;

        let mut passthrough = vec![false; batch.unique.len()];
        {
            let mut memory = self.memory.borrow_mut();
            for ((&index, translated), &failed) in missing
                .iter()
                .zip(output.translations.iter())
                .zip(output.passthrough.iter())
            {
                if failed {
                    passthrough[index] = true;
                } else {
                    memory.insert(lang, &batch.unique[index], translated.clone());
                    resolved[index] = Some(translated.clone());
                }
            }
        }

        let applied = self.apply(&batch, &resolved, lang);

        let mut stats = self.stats.borrow_mut();
        stats.cycles_completed += 1;
        stats.cache_hits += hits;
        stats.strings_requested += texts.len();
        stats.passthrough_strings += output.stats.passthrough_strings;
        stats.chunks_failed += output.stats.failed_chunks;
        tracing::info!(
            "翻译为 {} 完成: 写回 {} 个节点, 缓存命中 {}, 原文直出 {}",
            lang,
            applied,
            hits,
            output.stats.passthrough_strings
        );
    }

    /// 写回译文并标记父元素，返回写回的节点数
    ///
    /// 原文直出的节点显示原文。原文直出或被应用改写的节点，其父元素不做标记。
    fn apply(&self, batch: &CycleBatch, resolved: &[Option<String>], lang: &str) -> usize {
        let attr = self.config.translated_attr.as_str();
        let mut snapshots = self.snapshots.borrow_mut();
        let mut stats = self.stats.borrow_mut();

        let mut live = Vec::with_capacity(batch.members.len());
        let mut unmarked: HashSet<*const markup5ever_rcdom::Node> = HashSet::new();

        for member in &batch.members {
            if !is_attached(&member.node, &self.root) {
                stats.nodes_skipped_detached += 1;
                continue;
            }

            // 等待响应期间被应用改写的节点留给下一轮
            let current = text_content(&member.node).unwrap_or_default();
            let ours = snapshots
                .get(&member.node)
                .map(|entry| current == entry.original() || entry.applied() == Some(current.as_str()))
                .unwrap_or(false);
            let parent = get_parent_node(&member.node);
            if !ours {
                // 父元素不能标记，否则下一轮发现不到改写后的文本
                if let Some(parent) = &parent {
                    unmarked.insert(Rc::as_ptr(parent));
                }
                stats.nodes_skipped_stale += 1;
                continue;
            }

            if resolved[member.index].is_none() {
                if let Some(parent) = &parent {
                    unmarked.insert(Rc::as_ptr(parent));
                }
            }
            live.push((member, parent));
        }

        let mut applied = 0;
        for (member, parent) in live {
            match &resolved[member.index] {
                Some(translated) => {
                    let text = wrap_like_original(&member.original, translated);
                    if set_text_content(&member.node, &text) {
                        snapshots.record_applied(&member.node, Some(text));
                        applied += 1;
                    }
                }
                None => {
                    set_text_content(&member.node, &member.original);
                    snapshots.record_applied(&member.node, None);
                }
            }

            if let Some(parent) = parent {
                if unmarked.contains(&Rc::as_ptr(&parent)) {
                    set_node_attr(&parent, attr, None);
                } else {
                    set_node_attr(&parent, attr, Some(lang.to_string()));
                }
            }
        }

        stats.nodes_applied += applied;
        applied
    }

    /// 把所有仍在文档中的跟踪节点恢复为原文，并清除全部翻译标记
    fn restore_all(&self) {
        let live = self.snapshots.borrow_mut().live_originals();
        let mut restored = 0;
        let mut detached = 0;

        {
            let mut snapshots = self.snapshots.borrow_mut();
            for (node, original) in &live {
                if !is_attached(node, &self.root) {
                    detached += 1;
                    continue;
                }
                if set_text_content(node, original) {
                    snapshots.record_applied(node, None);
                    restored += 1;
                }
            }
            snapshots.prune();
        }

        clear_markers(&self.root, &self.config.translated_attr);

        let mut stats = self.stats.borrow_mut();
        stats.restores += 1;
        stats.nodes_skipped_detached += detached;
        tracing::info!("已还原 {} 个节点的原文", restored);
    }

    /// 吸收一条 DOM 变化，返回它是否可能带来需要翻译的文本
    fn absorb_mutation(&self, mutation: &Mutation) -> bool {
        let attr = self.config.translated_attr.as_str();
        match mutation {
            Mutation::NodesAdded(nodes) => nodes.iter().fold(false, |acc, node| {
                let relevant = match &node.data {
                    // 直接挂到已标记元素下的新文本需要先清掉标记才能被发现
                    NodeData::Text { contents } if !is_blank(&contents.borrow()) => {
                        if let Some(parent) = get_parent_node(node) {
                            set_node_attr(&parent, attr, None);
                        }
                        true
                    }
                    _ => has_visible_text(node),
                };
                relevant || acc
            }),
            Mutation::CharacterData(node) => {
                let Some(current) = text_content(node) else {
                    return false;
                };
                if is_blank(&current) {
                    return false;
                }
                let own_write = self
                    .snapshots
                    .borrow()
                    .get(node)
                    .and_then(|entry| entry.applied().map(|applied| applied == current))
                    .unwrap_or(false);
                if own_write {
                    return false;
                }
                if let Some(parent) = get_parent_node(node) {
                    set_node_attr(&parent, attr, None);
                }
                true
            }
            Mutation::Attribute { target, name } => {
                let relevant = self.collector.borrow().filter().is_visibility_attr(name);
                if relevant {
                    tracing::trace!(
                        "可见性属性变化: <{}> {}",
                        crate::parsers::html::get_node_name(target).unwrap_or("?"),
                        name
                    );
                }
                relevant
            }
        }
    }
}

/// 子树中是否有非空白文本
fn has_visible_text(node: &Handle) -> bool {
    match &node.data {
        NodeData::Text { contents } => !is_blank(&contents.borrow()),
        _ => node.children.borrow().iter().any(has_visible_text),
    }
}

fn clear_markers(node: &Handle, attr: &str) {
    if get_node_attr(node, attr).is_some() {
        set_node_attr(node, attr, None);
    }
    for child in node.children.borrow().iter() {
        clear_markers(child, attr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::{find_first_element, html_to_dom};
    use crate::translation::backend::CompletionRequest;
    use crate::translation::error::{TranslationError, TranslationResult};

    /// 给每段文本加语言前缀
    struct Prefix;

    impl CompletionBackend for Prefix {
        async fn complete(&self, request: &CompletionRequest) -> TranslationResult<String> {
            let out: Vec<String> = request
                .texts
                .iter()
                .map(|t| format!("[{}] {}", request.target_lang, t))
                .collect();
            Ok(serde_json::to_string(&out)?)
        }
    }

    struct Down;

    impl CompletionBackend for Down {
        async fn complete(&self, _: &CompletionRequest) -> TranslationResult<String> {
            Err(TranslationError::NetworkError("offline".into()))
        }
    }

    fn config() -> TranslationConfig {
        TranslationConfig {
            chunk_delay_ms: 0,
            ..TranslationConfig::default()
        }
    }

    fn paragraph_text(root: &Handle) -> String {
        let p = find_first_element(root, "p").unwrap();
        let text = p.children.borrow()[0].clone();
        text_content(&text).unwrap()
    }

    #[tokio::test]
    async fn test_state_transitions_to_idle() {
        let dom = html_to_dom(b"<p>Hello</p>", "utf-8").unwrap();
        let sync = Synchronizer::new(dom.document.clone(), Prefix, config());
        assert_eq!(sync.state(), SyncState::Idle);

        let outcome = sync.request_translation("fr").await;
        assert_eq!(outcome, RequestOutcome::Completed { cycles: 1 });
        assert_eq!(sync.state(), SyncState::Idle);
        assert_eq!(paragraph_text(&dom.document), "[fr] Hello");
    }

    #[tokio::test]
    async fn test_passthrough_leaves_parent_unmarked() {
        let dom = html_to_dom(b"<p>Hello</p>", "utf-8").unwrap();
        let sync = Synchronizer::new(dom.document.clone(), Down, config());

        sync.request_translation("fr").await;
        let p = find_first_element(&dom.document, "p").unwrap();
        assert_eq!(paragraph_text(&dom.document), "Hello");
        assert_eq!(get_node_attr(&p, "data-translated"), None);
        assert_eq!(sync.stats().passthrough_strings, 1);
        assert_eq!(sync.cache_stats().total_entries, 0);
    }

    #[tokio::test]
    async fn test_cache_serves_second_visit() {
        let dom = html_to_dom(b"<p>Hello</p>", "utf-8").unwrap();
        let sync = Synchronizer::new(dom.document.clone(), Prefix, config());

        sync.request_translation("fr").await;
        sync.restore_original().await;
        sync.request_translation("fr").await;

        let stats = sync.stats();
        assert_eq!(stats.strings_requested, 1);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(paragraph_text(&dom.document), "[fr] Hello");
    }

    #[tokio::test]
    async fn test_own_write_is_not_a_relevant_mutation() {
        let dom = html_to_dom(b"<p>Hello</p>", "utf-8").unwrap();
        let sync = Synchronizer::new(dom.document.clone(), Prefix, config());
        sync.request_translation("fr").await;

        let p = find_first_element(&dom.document, "p").unwrap();
        let text = p.children.borrow()[0].clone();
        let outcome = sync.on_mutations(&[Mutation::CharacterData(text)]).await;
        assert_eq!(outcome, RequestOutcome::Skipped);

        let outcome = sync
            .on_mutations(&[Mutation::Attribute {
                target: p.clone(),
                name: "data-translated".into(),
            }])
            .await;
        assert_eq!(outcome, RequestOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_route_change_in_source_language_is_skipped() {
        let dom = html_to_dom(b"<p>Hello</p>", "utf-8").unwrap();
        let sync = Synchronizer::new(dom.document.clone(), Prefix, config());
        assert_eq!(sync.on_route_changed("/about").await, RequestOutcome::Skipped);
        assert_eq!(sync.stats().cycles_completed, 0);
    }
}
