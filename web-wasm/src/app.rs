//! メインアプリケーションコンポーネント

use crate::components::header::Header;
use crate::pages::{
    camera::CameraPage, categorize::CategorizePage, detect::DetectPage,
    live_stream::LiveStreamPage, realtime::RealtimePage,
};
use crate::theme;
use leptos::prelude::*;

/// 表示中のページ
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    Detect,
    Categorize,
    Realtime,
    Camera,
    LiveStream,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Detect,
        Page::Categorize,
        Page::Realtime,
        Page::Camera,
        Page::LiveStream,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Page::Detect => "物体検出",
            Page::Categorize => "分類",
            Page::Realtime => "リアルタイム",
            Page::Camera => "カメラ",
            Page::LiveStream => "ライブ配信",
        }
    }
}

#[component]
pub fn App() -> impl IntoView {
    let store = StoredValue::new(theme::init_store());
    let (theme_mode, set_theme_mode) = signal(store.with_value(|s| s.mode()));
    let (page, set_page) = signal(Page::Detect);

    // ルート要素のクラスを常に現在のテーマに合わせる
    Effect::new(move |_| theme::apply(theme_mode.get()));

    let on_toggle_theme = move || {
        if let Some(mode) = store.try_update_value(|s| s.toggle()) {
            set_theme_mode.set(mode);
        }
    };

    view! {
        <div class="container">
            <Header
                page=page
                set_page=set_page
                theme=theme_mode
                on_toggle_theme=on_toggle_theme
            />

            // ページを切り替えると前のページの状態は破棄される
            <main class="page">
                {move || match page.get() {
                    Page::Detect => view! { <DetectPage /> }.into_any(),
                    Page::Categorize => view! { <CategorizePage /> }.into_any(),
                    Page::Realtime => view! { <RealtimePage /> }.into_any(),
                    Page::Camera => view! { <CameraPage /> }.into_any(),
                    Page::LiveStream => view! { <LiveStreamPage /> }.into_any(),
                }}
            </main>
        </div>
    }
}
