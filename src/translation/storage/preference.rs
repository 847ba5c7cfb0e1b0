//! 语言偏好持久化
//!
//! 记住用户最后一次明确选择的语言，下次加载页面时据此自动翻译。

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::translation::error::{TranslationError, TranslationResult};

/// 语言偏好存储
pub trait PreferenceStore {
    fn load(&self) -> TranslationResult<Option<String>>;
    fn save(&self, lang: &str) -> TranslationResult<()>;
}

impl<T: PreferenceStore + ?Sized> PreferenceStore for Box<T> {
    fn load(&self) -> TranslationResult<Option<String>> {
        (**self).load()
    }

    fn save(&self, lang: &str) -> TranslationResult<()> {
        (**self).save(lang)
    }
}

/// 仅保存在内存中的偏好
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    language: RefCell<Option<String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_language(lang: &str) -> Self {
        Self {
            language: RefCell::new(Some(lang.to_string())),
        }
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> TranslationResult<Option<String>> {
        Ok(self.language.borrow().clone())
    }

    fn save(&self, lang: &str) -> TranslationResult<()> {
        *self.language.borrow_mut() = Some(lang.to_string());
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PreferenceFile {
    language: String,
}

/// 以 JSON 文件保存的偏好
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self) -> TranslationResult<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| TranslationError::StorageError(format!("读取偏好文件失败: {}", e)))?;
        let file: PreferenceFile = serde_json::from_str(&content)?;
        let language = file.language.trim().to_string();

        Ok((!language.is_empty()).then_some(language))
    }

    fn save(&self, lang: &str) -> TranslationResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| TranslationError::StorageError(format!("创建偏好目录失败: {}", e)))?;
        }
        let content = serde_json::to_string_pretty(&PreferenceFile {
            language: lang.to_string(),
        })?;
        fs::write(&self.path, content)
            .map_err(|e| TranslationError::StorageError(format!("写入偏好文件失败: {}", e)))?;

        tracing::debug!("语言偏好已保存: {} -> {}", lang, self.path.display());
        Ok(())
    }
}
