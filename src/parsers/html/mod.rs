//! HTML解析和处理模块
//!
//! - `dom`: 基础DOM操作（读写文本、属性、父子关系）
//! - `style`: 基于内联样式的可见性推断
//! - `serializer`: 序列化功能

pub mod dom;
pub mod serializer;
pub mod style;

pub use dom::{
    append_child, create_element_node, create_text_node, element_ancestors, find_first_element,
    get_node_attr, get_node_name, get_parent_node, has_class, html_to_dom, is_attached,
    remove_from_parent, set_node_attr, set_text_content, text_content,
};
pub use serializer::serialize_document;
pub use style::{parse_inline_style, Visibility};
