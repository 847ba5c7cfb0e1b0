//! 简化的配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::env::{cache, core, translation, EnvVar};
use crate::translation::error::{TranslationError, TranslationResult};

/// 翻译配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationConfig {
    // 语言
    pub source_lang: String,
    /// 为空表示尚未选择，保持原文
    pub target_lang: String,

    // 远端服务
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub request_timeout_secs: u64,

    // 批次配置
    pub chunk_size: usize,
    pub chunk_delay_ms: u64,

    // 缓存配置
    pub cache_enabled: bool,
    pub cache_size: usize,

    // DOM 标记
    pub translated_attr: String,
    pub skip_attr: String,

    /// 语言偏好持久化文件，未设置时只保存在内存
    pub preference_path: Option<PathBuf>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            source_lang: constants::DEFAULT_SOURCE_LANG.to_string(),
            target_lang: String::new(),

            api_url: constants::DEFAULT_API_URL.to_string(),
            api_key: None,
            model: constants::DEFAULT_MODEL.to_string(),
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT.as_secs(),

            chunk_size: constants::DEFAULT_CHUNK_SIZE,
            chunk_delay_ms: constants::DEFAULT_CHUNK_DELAY.as_millis() as u64,

            cache_enabled: true,
            cache_size: constants::DEFAULT_CACHE_SIZE,

            translated_attr: constants::TRANSLATED_ATTR.to_string(),
            skip_attr: constants::SKIP_ATTR.to_string(),

            preference_path: None,
        }
    }
}

impl TranslationConfig {
    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if self.chunk_size == 0 {
            return Err(TranslationError::ConfigError("批次大小不能为0".to_string()));
        }

        if self.request_timeout_secs == 0 {
            return Err(TranslationError::ConfigError("请求超时不能为0".to_string()));
        }

        if self.cache_enabled && self.cache_size == 0 {
            return Err(TranslationError::ConfigError(
                "启用缓存时缓存大小不能为0".to_string(),
            ));
        }

        if self.source_lang.trim().is_empty() {
            return Err(TranslationError::ConfigError("源语言不能为空".to_string()));
        }

        if self.translated_attr.is_empty() || self.skip_attr.is_empty() {
            return Err(TranslationError::ConfigError("标记属性名不能为空".to_string()));
        }

        let url = url::Url::parse(&self.api_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TranslationError::ConfigError(format!(
                "API地址必须使用 http 或 https: {}",
                self.api_url
            )));
        }

        Ok(())
    }

    /// 应用环境变量覆盖，解析失败的变量被忽略并记录
    pub fn apply_env_overrides(&mut self) {
        fn apply<T>(result: Option<crate::env::EnvResult<T>>, target: impl FnOnce(T)) {
            match result {
                Some(Ok(value)) => target(value),
                Some(Err(e)) => tracing::warn!("忽略无效的环境变量: {}", e),
                None => {}
            }
        }

        apply(translation::SourceLang::get_override(), |v| self.source_lang = v);
        apply(translation::TargetLang::get_override(), |v| self.target_lang = v);
        apply(translation::ApiUrl::get_override(), |v| {
            tracing::info!("环境变量覆盖 API URL: {}", v);
            self.api_url = v;
        });
        apply(translation::ApiKey::get_override(), |v| self.api_key = Some(v));
        apply(translation::Model::get_override(), |v| self.model = v);
        apply(translation::ChunkSize::get_override(), |v| self.chunk_size = v);
        apply(translation::ChunkDelay::get_override(), |v: Duration| {
            self.chunk_delay_ms = v.as_millis() as u64
        });
        apply(translation::RequestTimeout::get_override(), |v: Duration| {
            self.request_timeout_secs = v.as_secs()
        });
        apply(translation::PreferencePath::get_override(), |v: String| {
            self.preference_path = Some(PathBuf::from(shellexpand::tilde(&v).as_ref()))
        });

        // 缓存相关环境变量
        apply(cache::Enabled::get_override(), |v| self.cache_enabled = v);
        apply(cache::Size::get_override(), |v| self.cache_size = v);
    }

    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 目标语言是否就是源语言（或未选择），此时只需还原
    pub fn is_source_lang(&self, lang: &str) -> bool {
        let lang = lang.trim();
        lang.is_empty() || lang.eq_ignore_ascii_case(self.source_lang.trim())
    }
}

/// 简化的配置管理器
pub struct ConfigManager {
    config: TranslationConfig,
}

impl ConfigManager {
    /// 按 .env → 配置文件 → 环境变量的顺序创建配置
    pub fn new() -> TranslationResult<Self> {
        let mut config = Self::load_config()?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 从指定文件创建配置，环境变量仍然生效
    pub fn from_file(path: &Path) -> TranslationResult<Self> {
        Self::load_dotenv();
        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 获取配置
    pub fn get_config(&self) -> &TranslationConfig {
        &self.config
    }

    pub fn into_config(self) -> TranslationConfig {
        self.config
    }

    /// 以当前配置为底，替换目标语言和 API 地址
    pub fn create_simple_config(&self, target_lang: &str, api_url: Option<&str>) -> TranslationConfig {
        let mut config = self.config.clone();
        config.target_lang = target_lang.to_string();
        if let Some(url) = api_url {
            config.api_url = url.to_string();
        }
        config
    }

    /// 从文件加载配置
    fn load_config() -> TranslationResult<TranslationConfig> {
        // 首先尝试加载 .env 文件
        Self::load_dotenv();

        if let Some(Ok(path)) = core::ConfigPath::get_override() {
            let expanded = shellexpand::tilde(&path).into_owned();
            return Self::load_from_file(Path::new(&expanded));
        }

        // 查找配置文件
        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            let candidate = Path::new(expanded_path.as_ref());
            if candidate.exists() {
                return Self::load_from_file(candidate);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(TranslationConfig::default())
    }

    /// 从指定文件加载配置
    fn load_from_file(path: &Path) -> TranslationResult<TranslationConfig> {
        tracing::info!("加载配置文件: {}", path.display());

        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslationError::ConfigError(format!("读取配置文件失败: {}", e)))?;

        // 尝试TOML格式
        if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析TOML配置失败: {}", e)))
        } else {
            // 尝试JSON格式
            serde_json::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析JSON配置失败: {}", e)))
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &Path) -> TranslationResult<()> {
        let config = TranslationConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslationError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}
