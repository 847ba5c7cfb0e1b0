//! 资源解析器模块
//!
//! 目前只包含 HTML：文档解析、DOM 读写与序列化。

pub mod html;

pub use html::{html_to_dom, serialize_document};
