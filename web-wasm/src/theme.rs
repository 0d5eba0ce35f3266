//! テーマの保存とルート要素への反映

use smear_vision_common::theme::THEME_STORAGE_KEY;
use smear_vision_common::{ThemeMode, ThemeStorage, ThemeStore};

/// localStorage に保存する
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserStorage;

impl ThemeStorage for BrowserStorage {
    // JSON化せず "light" / "dark" をそのまま保存する
    fn load(&self) -> Option<String> {
        local_storage()?.get_item(THEME_STORAGE_KEY).ok().flatten()
    }

    fn save(&mut self, value: &str) -> smear_vision_common::Result<()> {
        let storage = local_storage()
            .ok_or_else(|| smear_vision_common::Error::Config("localStorage unavailable".into()))?;
        storage.set_item(THEME_STORAGE_KEY, value).map_err(|e| {
            gloo::console::debug!("theme not persisted", e.clone());
            smear_vision_common::Error::Config(format!("{:?}", e))
        })
    }
}

// サンドボックス化されたiframeでは取得自体が例外になる
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

/// OSの配色設定
pub fn prefers_dark() -> bool {
    web_sys::window()
        .and_then(|w| w.match_media("(prefers-color-scheme: dark)").ok().flatten())
        .map(|mq| mq.matches())
        .unwrap_or(false)
}

pub fn init_store() -> ThemeStore<BrowserStorage> {
    ThemeStore::init(BrowserStorage, prefers_dark())
}

/// `<html>` に現在のクラスを付け、もう一方を外す
pub fn apply(mode: ThemeMode) {
    let Some(root) = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.document_element())
    else {
        return;
    };
    let classes = root.class_list();
    let _ = classes.remove_1(mode.inactive_class());
    let _ = classes.add_1(mode.as_str());
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn root_has(class: &str) -> bool {
        web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.document_element())
            .map(|root| root.class_list().contains(class))
            .unwrap_or(false)
    }

    #[wasm_bindgen_test]
    fn test_apply_keeps_single_class() {
        apply(ThemeMode::Dark);
        assert!(root_has("dark"));
        assert!(!root_has("light"));

        apply(ThemeMode::Light);
        assert!(root_has("light"));
        assert!(!root_has("dark"));
    }

    #[wasm_bindgen_test]
    fn test_toggle_persists_raw_value() {
        let mut store = ThemeStore::init(BrowserStorage, false);
        let first = store.mode();
        let toggled = store.toggle();
        assert_eq!(toggled, first.toggled());
        assert_eq!(BrowserStorage.load().as_deref(), Some(toggled.as_str()));

        // 再読込で保存値が優先される
        let reloaded = ThemeStore::init(BrowserStorage, !toggled.is_dark());
        assert_eq!(reloaded.mode(), toggled);
    }
}
