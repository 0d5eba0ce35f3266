//! ライト/ダーク テーマの状態
//!
//! 保存済みの値があればそれを優先し、なければOSの配色設定に従う。
//! 変更のたびに保存する。保存の失敗（サンドボックス等）は無視する。

use crate::error::Result;

/// localStorage のキー
pub const THEME_STORAGE_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    /// 保存値かつルート要素のクラス名
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "light" => Some(ThemeMode::Light),
            "dark" => Some(ThemeMode::Dark),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }

    pub fn is_dark(&self) -> bool {
        matches!(self, ThemeMode::Dark)
    }

    /// 外すべきクラス名
    pub fn inactive_class(&self) -> &'static str {
        self.toggled().as_str()
    }
}

/// テーマの永続化先
pub trait ThemeStorage {
    fn load(&self) -> Option<String>;
    fn save(&mut self, value: &str) -> Result<()>;
}

pub struct ThemeStore<S: ThemeStorage> {
    storage: S,
    mode: ThemeMode,
}

impl<S: ThemeStorage> ThemeStore<S> {
    /// `prefers_dark` はOSの `prefers-color-scheme: dark`
    pub fn init(storage: S, prefers_dark: bool) -> Self {
        let mode = storage
            .load()
            .as_deref()
            .and_then(ThemeMode::parse)
            .unwrap_or(if prefers_dark { ThemeMode::Dark } else { ThemeMode::Light });
        Self { storage, mode }
    }

    pub fn mode(&self) -> ThemeMode {
        self.mode
    }

    pub fn set(&mut self, mode: ThemeMode) -> ThemeMode {
        self.mode = mode;
        // 保存できなくても表示は切り替える
        let _ = self.storage.save(mode.as_str());
        mode
    }

    pub fn toggle(&mut self) -> ThemeMode {
        self.set(self.mode.toggled())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

/// テスト・CLI用のメモリ上の保存先
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    pub value: Option<String>,
    pub fail_writes: bool,
}

impl ThemeStorage for MemoryStorage {
    fn load(&self) -> Option<String> {
        self.value.clone()
    }

    fn save(&mut self, value: &str) -> Result<()> {
        if self.fail_writes {
            return Err(crate::Error::Config("storage unavailable".into()));
        }
        self.value = Some(value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_falls_back_to_os_preference() {
        let store = ThemeStore::init(MemoryStorage::default(), true);
        assert_eq!(store.mode(), ThemeMode::Dark);
        let store = ThemeStore::init(MemoryStorage::default(), false);
        assert_eq!(store.mode(), ThemeMode::Light);
    }

    #[test]
    fn test_persisted_value_wins() {
        let storage = MemoryStorage {
            value: Some("light".into()),
            ..Default::default()
        };
        let store = ThemeStore::init(storage, true);
        assert_eq!(store.mode(), ThemeMode::Light);
    }

    #[test]
    fn test_unknown_value_ignored() {
        let storage = MemoryStorage {
            value: Some("sepia".into()),
            ..Default::default()
        };
        let store = ThemeStore::init(storage, true);
        assert_eq!(store.mode(), ThemeMode::Dark);
    }

    #[test]
    fn test_toggle_survives_reload() {
        let mut store = ThemeStore::init(MemoryStorage::default(), false);
        assert_eq!(store.toggle(), ThemeMode::Dark);
        let reloaded = ThemeStore::init(store.storage().clone(), false);
        assert_eq!(reloaded.mode(), ThemeMode::Dark);
    }

    #[test]
    fn test_toggle_alternates_classes() {
        let mut store = ThemeStore::init(MemoryStorage::default(), false);
        for _ in 0..5 {
            let mode = store.toggle();
            assert_ne!(mode.as_str(), mode.inactive_class());
        }
    }

    #[test]
    fn test_write_failure_is_silent() {
        let storage = MemoryStorage {
            fail_writes: true,
            ..Default::default()
        };
        let mut store = ThemeStore::init(storage, false);
        assert_eq!(store.toggle(), ThemeMode::Dark);
        assert_eq!(store.mode(), ThemeMode::Dark);
        assert!(store.storage().value.is_none());
    }
}
