// 集成测试公共模块
//
// 提供 HTML 夹具、DOM 查询助手和若干模拟翻译后端

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use markup5ever_rcdom::{Handle, NodeData, RcDom};
use tokio::sync::Notify;
use tokio::time::Instant;

use livetranslate::parsers::html::{get_node_attr, get_node_name, html_to_dom, text_content};
use livetranslate::translation::{
    CompletionBackend, CompletionRequest, TranslationConfig, TranslationError, TranslationResult,
};

// ============================================================================
// DOM 助手
// ============================================================================

pub fn parse(html: &str) -> RcDom {
    html_to_dom(html.as_bytes(), "utf-8").expect("fixture parses")
}

/// 不带请求间隔的配置
pub fn fast_config() -> TranslationConfig {
    TranslationConfig {
        chunk_delay_ms: 0,
        ..TranslationConfig::default()
    }
}

/// 按文档顺序找出所有指定标签的元素
pub fn find_all(node: &Handle, tag: &str) -> Vec<Handle> {
    let mut found = Vec::new();
    collect(node, tag, &mut found);
    found
}

fn collect(node: &Handle, tag: &str, found: &mut Vec<Handle>) {
    if get_node_name(node) == Some(tag) {
        found.push(node.clone());
    }
    for child in node.children.borrow().iter() {
        collect(child, tag, found);
    }
}

pub fn find_by_id(node: &Handle, id: &str) -> Option<Handle> {
    if get_node_attr(node, "id").as_deref() == Some(id) {
        return Some(node.clone());
    }
    node.children
        .borrow()
        .iter()
        .find_map(|child| find_by_id(child, id))
}

/// 元素的第一个文本子节点
pub fn first_text(element: &Handle) -> Handle {
    element
        .children
        .borrow()
        .iter()
        .find(|child| matches!(child.data, NodeData::Text { .. }))
        .cloned()
        .expect("element has a text child")
}

/// 元素直接文本子节点拼接后的内容
pub fn own_text(element: &Handle) -> String {
    element
        .children
        .borrow()
        .iter()
        .filter_map(text_content)
        .collect()
}

pub fn texts_of(root: &Handle, tag: &str) -> Vec<String> {
    find_all(root, tag).iter().map(own_text).collect()
}

/// 文档中带翻译标记的元素数量
pub fn marker_count(node: &Handle) -> usize {
    let own = usize::from(get_node_attr(node, "data-translated").is_some());
    own + node
        .children
        .borrow()
        .iter()
        .map(marker_count)
        .sum::<usize>()
}

fn encode(items: &[String]) -> TranslationResult<String> {
    Ok(serde_json::to_string(items)?)
}

// ============================================================================
// 模拟后端
// ============================================================================

/// 记录请求并给每段文本加 `[lang] ` 前缀
#[derive(Default)]
pub struct PrefixBackend {
    pub requests: RefCell<Vec<CompletionRequest>>,
}

impl PrefixBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted(&self) -> Vec<Vec<String>> {
        self.requests.borrow().iter().map(|r| r.texts.clone()).collect()
    }
}

impl CompletionBackend for PrefixBackend {
    async fn complete(&self, request: &CompletionRequest) -> TranslationResult<String> {
        self.requests.borrow_mut().push(request.clone());
        let out: Vec<String> = request
            .texts
            .iter()
            .map(|t| format!("[{}] {}", request.target_lang, t))
            .collect();
        encode(&out)
    }
}

/// 按词典翻译，查不到的原样返回
pub struct DictionaryBackend {
    entries: HashMap<String, String>,
    pub requests: RefCell<Vec<CompletionRequest>>,
}

impl DictionaryBackend {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            entries: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl CompletionBackend for DictionaryBackend {
    async fn complete(&self, request: &CompletionRequest) -> TranslationResult<String> {
        self.requests.borrow_mut().push(request.clone());
        let out: Vec<String> = request
            .texts
            .iter()
            .map(|t| self.entries.get(t).cloned().unwrap_or_else(|| t.clone()))
            .collect();
        encode(&out)
    }
}

/// 依次返回预设的原始负载
pub struct ScriptedBackend {
    replies: RefCell<Vec<TranslationResult<String>>>,
    pub requests: RefCell<Vec<CompletionRequest>>,
}

impl ScriptedBackend {
    pub fn new(replies: Vec<TranslationResult<String>>) -> Self {
        Self {
            replies: RefCell::new(replies.into_iter().rev().collect()),
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, request: &CompletionRequest) -> TranslationResult<String> {
        self.requests.borrow_mut().push(request.clone());
        self.replies
            .borrow_mut()
            .pop()
            .unwrap_or_else(|| Err(TranslationError::InternalError("no scripted reply".into())))
    }
}

/// 第 `fail_on` 次调用（从 1 开始）返回网络错误，其余加前缀
pub struct FailingCallBackend {
    fail_on: usize,
    calls: Cell<usize>,
}

impl FailingCallBackend {
    pub fn new(fail_on: usize) -> Self {
        Self {
            fail_on,
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl CompletionBackend for FailingCallBackend {
    async fn complete(&self, request: &CompletionRequest) -> TranslationResult<String> {
        let call = self.calls.get() + 1;
        self.calls.set(call);
        if call == self.fail_on {
            return Err(TranslationError::NetworkError("simulated outage".into()));
        }
        let out: Vec<String> = request
            .texts
            .iter()
            .map(|t| format!("[{}] {}", request.target_lang, t))
            .collect();
        encode(&out)
    }
}

/// 在 `release` 之前挂起所有请求，用于制造"翻译进行中"
#[derive(Default)]
pub struct GatedBackend {
    open: Cell<bool>,
    notify: Notify,
    pub requests: RefCell<Vec<CompletionRequest>>,
}

impl GatedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn release(&self) {
        self.open.set(true);
        self.notify.notify_waiters();
    }

    pub fn calls(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn languages(&self) -> Vec<String> {
        self.requests
            .borrow()
            .iter()
            .map(|r| r.target_lang.clone())
            .collect()
    }
}

impl CompletionBackend for GatedBackend {
    async fn complete(&self, request: &CompletionRequest) -> TranslationResult<String> {
        self.requests.borrow_mut().push(request.clone());
        while !self.open.get() {
            self.notify.notified().await;
        }
        let out: Vec<String> = request
            .texts
            .iter()
            .map(|t| format!("[{}] {}", request.target_lang, t))
            .collect();
        encode(&out)
    }
}

/// 记录每次调用的（可暂停的）时间点
#[derive(Default)]
pub struct TimedBackend {
    pub calls: RefCell<Vec<Instant>>,
}

impl CompletionBackend for TimedBackend {
    async fn complete(&self, request: &CompletionRequest) -> TranslationResult<String> {
        self.calls.borrow_mut().push(Instant::now());
        encode(&request.texts)
    }
}

/// 比超时更慢的后端
pub struct SlowBackend {
    pub delay: std::time::Duration,
}

impl CompletionBackend for SlowBackend {
    async fn complete(&self, request: &CompletionRequest) -> TranslationResult<String> {
        tokio::time::sleep(self.delay).await;
        encode(&request.texts)
    }
}
