//! 原文快照与去重
//!
//! 每个被跟踪的文本节点只记录一次原文，之后每一轮都从原文出发构造请求，
//! 避免"译文的译文"。节点以弱引用持有，被移出文档或释放后自然失效。

use std::collections::HashMap;
use std::rc::Rc;

use markup5ever_rcdom::{Handle, WeakHandle};

use super::filters::normalize_whitespace;
use crate::parsers::html::text_content;

/// 被跟踪的文本节点
#[derive(Debug, Clone)]
pub struct TrackedText {
    node: WeakHandle,
    original: String,
    applied: Option<String>,
}

impl TrackedText {
    fn new(node: &Handle, original: String) -> Self {
        Self {
            node: Rc::downgrade(node),
            original,
            applied: None,
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    /// 同步器最近一次写入的文本
    pub fn applied(&self) -> Option<&str> {
        self.applied.as_deref()
    }

    pub fn upgrade(&self) -> Option<Handle> {
        self.node.upgrade()
    }

    fn refers_to(&self, node: &Handle) -> bool {
        self.node
            .upgrade()
            .map(|live| Rc::ptr_eq(&live, node))
            .unwrap_or(false)
    }

    /// 当前文本既不是原文也不是我们写入的文本时，说明应用自己改写了内容，
    /// 以新内容作为原文。返回是否发生了替换。
    fn reconcile(&mut self, current: &str) -> bool {
        if current == self.original || self.applied.as_deref() == Some(current) {
            return false;
        }
        self.original = current.to_string();
        self.applied = None;
        true
    }
}

/// 节点 → 原文 的永久映射
#[derive(Debug, Default)]
pub struct SnapshotStore {
    entries: HashMap<usize, TrackedText>,
    refreshed: usize,
}

fn node_key(node: &Handle) -> usize {
    Rc::as_ptr(node) as usize
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 确保节点被跟踪，返回其原文
    pub fn track(&mut self, node: &Handle) -> Option<&str> {
        let current = text_content(node)?;
        let key = node_key(node);

        let known = self
            .entries
            .get(&key)
            .map(|entry| entry.refers_to(node))
            .unwrap_or(false);

        if known {
            let entry = self.entries.get_mut(&key)?;
            if entry.reconcile(&current) {
                self.refreshed += 1;
                tracing::debug!("节点内容已被应用改写，刷新原文快照");
            }
        } else {
            // 地址可能被已释放节点复用，此时旧条目作废
            self.entries.insert(key, TrackedText::new(node, current));
        }

        self.entries.get(&key).map(|entry| entry.original.as_str())
    }

    pub fn get(&self, node: &Handle) -> Option<&TrackedText> {
        self.entries
            .get(&node_key(node))
            .filter(|entry| entry.refers_to(node))
    }

    pub fn original_of(&self, node: &Handle) -> Option<&str> {
        self.get(node).map(TrackedText::original)
    }

    /// 记录同步器写入节点的文本
    pub fn record_applied(&mut self, node: &Handle, text: Option<String>) {
        if let Some(entry) = self.entries.get_mut(&node_key(node)) {
            if entry.refers_to(node) {
                entry.applied = text;
            }
        }
    }

    /// 还原前对齐快照，返回 (节点, 原文) 列表，只包含仍然存活的节点
    pub fn live_originals(&mut self) -> Vec<(Handle, String)> {
        let mut live = Vec::with_capacity(self.entries.len());
        for entry in self.entries.values_mut() {
            if let Some(node) = entry.upgrade() {
                if let Some(current) = text_content(&node) {
                    if entry.reconcile(&current) {
                        self.refreshed += 1;
                    }
                }
                live.push((node, entry.original.clone()));
            }
        }
        live
    }

    /// 删除已释放节点的条目，返回删除数量
    pub fn prune(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.node.strong_count() > 0);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 因应用改写而刷新过原文的次数
    pub fn refreshed_count(&self) -> usize {
        self.refreshed
    }

    /// 为一轮翻译构造去重后的批次
    pub fn build_batch(&mut self, nodes: &[Handle]) -> CycleBatch {
        let mut batch = CycleBatch::default();
        let mut index_of: HashMap<String, usize> = HashMap::new();

        for node in nodes {
            let Some(original) = self.track(node).map(str::to_string) else {
                continue;
            };
            let normalized = normalize_whitespace(&original);
            if normalized.is_empty() {
                continue;
            }

            let index = *index_of.entry(normalized.clone()).or_insert_with(|| {
                batch.unique.push(normalized.clone());
                batch
                    .representatives
                    .insert(normalized.clone(), original.trim().to_string());
                batch.unique.len() - 1
            });
            batch.members.push(BatchMember {
                node: node.clone(),
                original,
                index,
            });
        }

        batch
    }
}

/// 一轮翻译中的一个节点
#[derive(Debug, Clone)]
pub struct BatchMember {
    pub node: Handle,
    /// 节点的原文快照（未归一化）
    pub original: String,
    /// 在 `CycleBatch::unique` 中的位置
    pub index: usize,
}

/// 一轮翻译的去重结果
#[derive(Debug, Default)]
pub struct CycleBatch {
    /// 按首次出现顺序排列的归一化文本
    pub unique: Vec<String>,
    /// 归一化文本 → 首次出现的原始写法（仅去首尾空白）
    pub representatives: HashMap<String, String>,
    pub members: Vec<BatchMember>,
}

impl CycleBatch {
    pub fn is_empty(&self) -> bool {
        self.unique.is_empty()
    }

    /// 提交给远端服务的文本
    pub fn submission(&self, index: usize) -> &str {
        let normalized = &self.unique[index];
        self.representatives
            .get(normalized)
            .map(String::as_str)
            .unwrap_or(normalized)
    }
}
