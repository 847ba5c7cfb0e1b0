//! 同步器核心
//!
//! - **synchronizer**: 合并式状态机，一轮翻译的编排、写回与还原
//! - **events**: 语言切换、DOM 变化、路由切换等触发源的事件通道
//! - **stats**: 运行统计
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use livetranslate::parsers::html_to_dom;
//! use livetranslate::translation::{core::{channel, pump_events, Synchronizer}, HttpCompletionBackend, TranslationConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dom = html_to_dom(b"<p>Welcome home</p>", "utf-8")?;
//! let config = TranslationConfig::default();
//! let backend = HttpCompletionBackend::new(&config)?;
//! let sync = Rc::new(Synchronizer::new(dom.document.clone(), backend, config));
//!
//! let (handle, rx) = channel();
//! handle.select_language("fr");
//! drop(handle);
//!
//! let local = tokio::task::LocalSet::new();
//! local.run_until(pump_events(Rc::clone(&sync), rx)).await;
//! # Ok(())
//! # }
//! ```

pub mod events;
pub mod stats;
pub mod synchronizer;

pub use events::{channel, pump_events, Mutation, SyncEvent, SyncHandle};
pub use stats::SyncStats;
pub use synchronizer::{RequestOutcome, SyncState, Synchronizer};
