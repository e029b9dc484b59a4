use crate::config::types::{SETTINGS_FILE_NAME, ThumbnailSettings};
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

impl ThumbnailSettings {
    /// 從目前工作目錄的設定檔載入
    ///
    /// 只有檔案不存在時使用預設值；無法解析或不合法的設定直接回傳錯誤。
    pub fn load_or_default() -> Result<Self> {
        Self::load(Path::new(SETTINGS_FILE_NAME))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("設定檔不存在，使用預設值: {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        let settings: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))?;

        settings
            .validate()
            .with_context(|| format!("Invalid settings in {}", path.display()))?;

        Ok(settings)
    }
}
