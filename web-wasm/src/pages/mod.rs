pub mod camera;
pub mod categorize;
pub mod detect;
pub mod live_stream;
pub mod realtime;

use crate::api::socket::{SocketClient, SocketEvent};
use smear_vision_common::SelectedFile;
use web_sys::{File, Url};

/// 選択ファイルとプレビュー用の object URL
pub(crate) fn select(file: File) -> SelectedFile<File> {
    let preview_url = Url::create_object_url_with_blob(&file).unwrap_or_default();
    SelectedFile {
        name: file.name(),
        size: file.size() as u64,
        preview_url,
        file,
    }
}

pub(crate) fn release(selected: Option<SelectedFile<File>>) {
    if let Some(selected) = selected {
        if !selected.preview_url.is_empty() {
            let _ = Url::revoke_object_url(&selected.preview_url);
        }
    }
}

pub(crate) fn open_socket<F>(on_event: F) -> Result<SocketClient, String>
where
    F: Fn(SocketEvent) + 'static,
{
    let url = crate::api::endpoints()?
        .socket_url()
        .map_err(|e| e.to_string())?;
    SocketClient::connect(&url, on_event)
}

pub(crate) fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}
