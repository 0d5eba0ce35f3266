//! 物体検出ページ

use super::{release, select};
use crate::api::backend;
use crate::canvas;
use crate::components::{
    detection_list::DetectionList, error_banner::ErrorBanner, upload_area::UploadArea,
};
use leptos::html::{Canvas, Img};
use leptos::prelude::*;
use smear_vision_common::{DetectResponse, UploadForm};
use web_sys::File;

const DEFAULT_CONFIDENCE: f64 = 0.25;

#[component]
pub fn DetectPage() -> impl IntoView {
    let form = RwSignal::new_local(UploadForm::<File, DetectResponse>::new());
    let (confidence, set_confidence) = signal(DEFAULT_CONFIDENCE);
    let img_ref = NodeRef::<Img>::new();
    let canvas_ref = NodeRef::<Canvas>::new();

    let on_file = move |file: File| {
        let selected = select(file);
        release(form.try_update(|f| f.select_file(selected)).flatten());
    };

    let on_submit = move |_| {
        // 未選択（文言は form 側に入る）か送信中なら何もしない
        let Some(Ok(true)) = form.try_update(|f| f.begin_submit()) else {
            return;
        };
        let Some(file) = form.with_untracked(|f| f.file().map(|s| s.file.clone())) else {
            return;
        };
        let conf = confidence.get_untracked();
        wasm_bindgen_futures::spawn_local(async move {
            let outcome = backend::detect(&file, conf).await;
            if let Err(e) = &outcome {
                gloo::console::warn!(format!("detect failed: {}", e));
            }
            // ページを離れた後なら何もしない
            let _ = form.try_update(|f| f.finish(outcome));
        });
    };

    // 注釈付き画像が返ってきたらそれを表示し、枠は描かない
    let annotated = move || form.with(|f| f.result().and_then(|r| r.annotated_data_url()));

    // 枠はプレビュー画像の表示サイズに合わせて描き直す
    let redraw = move || {
        let (Some(img), Some(overlay)) = (img_ref.get_untracked(), canvas_ref.get_untracked()) else {
            return;
        };
        let width = img.client_width().max(0) as u32;
        let height = img.client_height().max(0) as u32;
        if canvas::reset(&overlay, width, height).is_none() {
            return;
        }
        form.with_untracked(|f| {
            if let Some(resp) = f.result().filter(|r| r.annotated_image.is_empty()) {
                let (sw, sh) = if resp.image_info.width > 0 && resp.image_info.height > 0 {
                    (resp.image_info.width, resp.image_info.height)
                } else {
                    (img.natural_width(), img.natural_height())
                };
                canvas::draw_detections(&overlay, &resp.detections, sw, sh);
            }
        });
    };
    Effect::new(move |_| {
        form.track();
        redraw();
    });

    on_cleanup(move || {
        release(form.try_update_untracked(|f| f.reset()).flatten());
    });

    let is_loading = Signal::derive(move || form.with(|f| f.is_loading()));
    let file_name = Signal::derive(move || form.with(|f| f.file().map(|s| s.name.clone())));
    let shown_image = move || {
        annotated().or_else(|| form.with(|f| f.file().map(|s| s.preview_url.clone())))
    };
    let error = Signal::derive(move || form.with(|f| f.error().map(str::to_string)));

    view! {
        <section class="card">
            <h2>"物体検出"</h2>
            <UploadArea on_file=on_file file_name=file_name />

            <div class="form-group">
                <label for="confidence">
                    {move || format!("信頼度の閾値: {:.2}", confidence.get())}
                </label>
                <input
                    type="range"
                    id="confidence"
                    min="0.05"
                    max="0.95"
                    step="0.05"
                    prop:value=move || confidence.get().to_string()
                    on:input=move |ev| {
                        if let Ok(value) = event_target_value(&ev).parse::<f64>() {
                            set_confidence.set(value);
                        }
                    }
                />
            </div>

            <button class="btn btn-primary" prop:disabled=move || is_loading.get() on:click=on_submit>
                {move || if is_loading.get() { "解析中..." } else { "解析開始" }}
            </button>

            <ErrorBanner message=error />

            <Show when=move || shown_image().is_some()>
                <div class="preview">
                    <img
                        node_ref=img_ref
                        src=move || shown_image().unwrap_or_default()
                        alt="入力画像"
                        on:load=move |_| redraw()
                    />
                    <canvas node_ref=canvas_ref class="overlay"></canvas>
                </div>
            </Show>

            {move || {
                form.with(|f| f.result().cloned())
                    .map(|response| view! { <DetectionList response=response /> })
            }}
        </section>
    }
}
