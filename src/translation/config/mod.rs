//! 翻译配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{ConfigManager, TranslationConfig};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 批次处理相关
    pub const DEFAULT_CHUNK_SIZE: usize = 25;
    pub const DEFAULT_CHUNK_DELAY: Duration = Duration::from_millis(4000);
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    // 默认API设置
    pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
    pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
    pub const DEFAULT_SOURCE_LANG: &str = "en";

    // 缓存设置
    pub const DEFAULT_CACHE_SIZE: usize = 2000;

    // DOM 标记
    pub const TRANSLATED_ATTR: &str = "data-translated";
    pub const SKIP_ATTR: &str = "data-no-translate";
    pub const SKIP_CLASS: &str = "notranslate";

    // 跳过的元素：机器可读内容或不渲染文本的容器
    pub const SKIP_ELEMENTS: &[&str] = &[
        "script", "style", "code", "pre", "noscript", "textarea", "template",
    ];

    // 会改变可见性的属性，观察到变化时需要重新扫描
    pub const VISIBILITY_ATTRS: &[&str] = &["style", "class", "hidden"];

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "livetranslate.toml",
        ".livetranslate.toml",
        "~/.config/livetranslate/config.toml",
        "/etc/livetranslate/config.toml",
    ];
}
