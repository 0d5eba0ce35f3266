use crate::error::{Result, SmearError};
use serde::{Deserialize, Serialize};
use smear_vision_common::DEFAULT_API_BASE;
use std::path::{Path, PathBuf};

/// 環境変数でバックエンドURLを上書きできる
pub const API_BASE_ENV: &str = "SMEAR_API_BASE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base: String,
    pub default_confidence: f64,
    pub default_alpha: f64,
    /// アップロード前に縮小する長辺の上限(px)
    pub max_image_size: u32,
    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            default_confidence: 0.25,
            default_alpha: 0.5,
            max_image_size: 1920,
            timeout_seconds: 60,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| SmearError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("smear-vision").join("config.json"))
    }

    /// 環境変数を優先
    pub fn api_base(&self) -> String {
        match std::env::var(API_BASE_ENV) {
            Ok(base) if !base.trim().is_empty() => base,
            _ => self.api_base.clone(),
        }
    }

    pub fn set_confidence(&mut self, confidence: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(SmearError::Config(format!(
                "信頼度は0.0〜1.0で指定してください: {}",
                confidence
            )));
        }
        self.default_confidence = confidence;
        Ok(())
    }

    pub fn set_api_base(&mut self, base: String) -> Result<()> {
        // URLとして組み立てられるか先に確認
        smear_vision_common::ApiEndpoints::new(&base)?;
        self.api_base = base;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("none.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = Config::default();
        config.set_confidence(0.4).unwrap();
        config.set_api_base("http://10.0.0.2:8000".into()).unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.default_confidence, 0.4);
        assert_eq!(loaded.api_base, "http://10.0.0.2:8000");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_base": "http://gpu-box:5000"}"#).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_base, "http://gpu-box:5000");
        assert_eq!(loaded.max_image_size, 1920);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.set_confidence(1.5).is_err());
        assert!(config.set_api_base("gopher://x".into()).is_err());
        assert_eq!(config, Config::default());
    }
}
