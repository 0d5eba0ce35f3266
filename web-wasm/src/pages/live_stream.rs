//! ライブ配信ページ（MJPEG を img 要素でそのまま表示）

use crate::components::{error_banner::ErrorBanner, stream_controls::StreamControls};
use leptos::prelude::*;
use smear_vision_common::session::StreamSource;
use smear_vision_common::{StreamKind, StreamParams};

#[component]
pub fn LiveStreamPage() -> impl IntoView {
    let kind = RwSignal::new(StreamKind::Detect);
    let source = RwSignal::new("0".to_string());
    let conf = RwSignal::new(0.25);
    let alpha = RwSignal::new(0.5);

    let stream_url = RwSignal::new(None::<String>);
    let loading = RwSignal::new(false);
    let error = RwSignal::new(None::<String>);

    let on_start = move |_| {
        let params = StreamParams {
            kind: kind.get_untracked(),
            source: StreamSource::parse(&source.get_untracked()),
            conf: conf.get_untracked(),
            alpha: alpha.get_untracked(),
        };
        match crate::api::endpoints().and_then(|e| e.stream_url(&params).map_err(|e| e.to_string())) {
            Ok(url) => {
                error.set(None);
                loading.set(true);
                stream_url.set(Some(url));
            }
            Err(e) => error.set(Some(e)),
        }
    };

    // img 要素を外すとブラウザが接続を閉じる
    let on_stop = move |_| {
        stream_url.set(None);
        loading.set(false);
    };

    let active = Signal::derive(move || stream_url.with(Option::is_some));

    view! {
        <section class="card">
            <h2>"ライブ配信"</h2>

            <StreamControls kind=kind conf=conf alpha=alpha source=source disabled=active />

            <div class="api-actions">
                <button class="btn btn-primary" prop:disabled=move || active.get() on:click=on_start>
                    "配信開始"
                </button>
                <button class="btn btn-tertiary" prop:disabled=move || !active.get() on:click=on_stop>
                    "停止"
                </button>
            </div>

            <ErrorBanner message=error />

            <Show when=move || loading.get()>
                <p class="text-muted">"接続中..."</p>
            </Show>

            {move || stream_url.get().map(|url| view! {
                <div class="preview">
                    <img
                        src=url
                        alt="ライブ配信"
                        on:load=move |_| loading.set(false)
                        on:error=move |_| {
                            loading.set(false);
                            stream_url.set(None);
                            error.set(Some("配信に接続できません。バックエンドを確認してください".to_string()));
                        }
                    />
                </div>
            })}
        </section>
    }
}
