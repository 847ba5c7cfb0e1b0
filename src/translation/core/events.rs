//! 触发源与事件通道
//!
//! 语言切换、DOM 变化、路由切换都只是往通道里投递一个 [`SyncEvent`]；
//! [`pump_events`] 在 `LocalSet` 上逐个消费，每个事件都交给同步器的请求入口，
//! 由其合并机制完成去抖。

use std::rc::Rc;

use markup5ever_rcdom::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;

use super::synchronizer::Synchronizer;
use crate::translation::backend::CompletionBackend;

/// 观察到的一次 DOM 变化
#[derive(Debug, Clone)]
pub enum Mutation {
    /// 新插入的节点（文本或子树）
    NodesAdded(Vec<Handle>),
    /// 文本节点内容被改写
    CharacterData(Handle),
    /// 元素属性变化
    Attribute { target: Handle, name: String },
}

/// 同步器事件
#[derive(Debug, Clone)]
pub enum SyncEvent {
    LanguageSelected(String),
    DomMutated(Vec<Mutation>),
    RouteChanged(String),
    RestoreOriginal,
}

/// 事件发送端，可随意克隆给各个触发源
#[derive(Debug, Clone)]
pub struct SyncHandle {
    tx: UnboundedSender<SyncEvent>,
}

impl SyncHandle {
    /// 投递事件，接收端已关闭时返回 `false`
    pub fn send(&self, event: SyncEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn select_language(&self, lang: &str) -> bool {
        self.send(SyncEvent::LanguageSelected(lang.to_string()))
    }

    pub fn restore_original(&self) -> bool {
        self.send(SyncEvent::RestoreOriginal)
    }

    pub fn notify_mutations(&self, mutations: Vec<Mutation>) -> bool {
        if mutations.is_empty() {
            return true;
        }
        self.send(SyncEvent::DomMutated(mutations))
    }

    pub fn route_changed(&self, path: &str) -> bool {
        self.send(SyncEvent::RouteChanged(path.to_string()))
    }
}

/// 创建事件通道
pub fn channel() -> (SyncHandle, UnboundedReceiver<SyncEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SyncHandle { tx }, rx)
}

/// 消费事件直到所有发送端关闭，并等待已派发的请求结束
///
/// 必须在 `tokio::task::LocalSet` 中运行。返回处理的事件数。
pub async fn pump_events<B>(sync: Rc<Synchronizer<B>>, mut rx: UnboundedReceiver<SyncEvent>) -> usize
where
    B: CompletionBackend + 'static,
{
    let mut tasks = JoinSet::new();
    let mut handled = 0;

    while let Some(event) = rx.recv().await {
        handled += 1;
        tracing::trace!("收到事件: {:?}", event);

        let sync = Rc::clone(&sync);
        tasks.spawn_local(async move { sync.handle_event(event).await });

        while let Some(result) = tasks.try_join_next() {
            if let Err(e) = result {
                tracing::error!("事件处理任务异常退出: {}", e);
            }
        }
    }

    while let Some(result) = tasks.join_next().await {
        if let Err(e) = result {
            tracing::error!("事件处理任务异常退出: {}", e);
        }
    }

    tracing::debug!("事件通道已关闭，共处理 {} 个事件", handled);
    handled
}
