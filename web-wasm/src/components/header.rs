//! ヘッダーコンポーネント

use crate::app::Page;
use leptos::prelude::*;
use smear_vision_common::ThemeMode;

#[component]
pub fn Header<F>(
    page: ReadSignal<Page>,
    set_page: WriteSignal<Page>,
    theme: ReadSignal<ThemeMode>,
    on_toggle_theme: F,
) -> impl IntoView
where
    F: Fn() + 'static,
{
    view! {
        <header class="header">
            <h1>"Smear Vision - 血液塗抹標本AI解析"</h1>
            <nav class="nav">
                {Page::ALL
                    .into_iter()
                    .map(|p| {
                        view! {
                            <button
                                class=move || if page.get() == p { "nav-item active" } else { "nav-item" }
                                on:click=move |_| set_page.set(p)
                            >
                                {p.label()}
                            </button>
                        }
                    })
                    .collect_view()}
            </nav>
            <button
                class="btn btn-tertiary theme-toggle"
                title="テーマ切替"
                on:click=move |_| on_toggle_theme()
            >
                {move || if theme.get().is_dark() { "☀️ ライト" } else { "🌙 ダーク" }}
            </button>
        </header>
    }
}
