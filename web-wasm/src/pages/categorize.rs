//! 分類（セグメンテーション）ページ

use super::{release, select};
use crate::api::backend;
use crate::components::{
    class_stats::ClassStats, error_banner::ErrorBanner, upload_area::UploadArea,
};
use leptos::prelude::*;
use smear_vision_common::types::ensure_data_url;
use smear_vision_common::{CategorizeResponse, UploadForm};
use web_sys::File;

#[component]
pub fn CategorizePage() -> impl IntoView {
    let form = RwSignal::new_local(UploadForm::<File, CategorizeResponse>::new());

    let on_file = move |file: File| {
        let selected = select(file);
        release(form.try_update(|f| f.select_file(selected)).flatten());
    };

    let on_submit = move |_| {
        let Some(Ok(true)) = form.try_update(|f| f.begin_submit()) else {
            return;
        };
        let Some(file) = form.with_untracked(|f| f.file().map(|s| s.file.clone())) else {
            return;
        };
        wasm_bindgen_futures::spawn_local(async move {
            let outcome = backend::categorize(&file).await;
            if let Err(e) = &outcome {
                gloo::console::warn!(format!("categorize failed: {}", e));
            }
            let _ = form.try_update(|f| f.finish(outcome));
        });
    };

    on_cleanup(move || {
        release(form.try_update_untracked(|f| f.reset()).flatten());
    });

    let is_loading = Signal::derive(move || form.with(|f| f.is_loading()));
    let file_name = Signal::derive(move || form.with(|f| f.file().map(|s| s.name.clone())));
    let error = Signal::derive(move || form.with(|f| f.error().map(str::to_string)));
    // 結果があればオーバーレイ画像、なければ選択中の画像
    let shown_image = move || {
        form.with(|f| match f.result() {
            Some(resp) if !resp.overlay_image.is_empty() => {
                Some(ensure_data_url(&resp.overlay_image, "image/png"))
            }
            _ => f.file().map(|s| s.preview_url.clone()),
        })
    };

    view! {
        <section class="card">
            <h2>"分類（セグメンテーション）"</h2>
            <UploadArea on_file=on_file file_name=file_name />

            <button class="btn btn-primary" prop:disabled=move || is_loading.get() on:click=on_submit>
                {move || if is_loading.get() { "解析中..." } else { "解析開始" }}
            </button>

            <ErrorBanner message=error />

            {move || shown_image().map(|src| view! {
                <div class="preview">
                    <img src=src alt="解析画像" />
                </div>
            })}

            {move || {
                form.with(|f| f.result().cloned())
                    .map(|response| view! { <ClassStats response=response /> })
            }}
        </section>
    }
}
