//! アップロードエリアコンポーネント（1枚のみ）

use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use web_sys::{DragEvent, File, FileList, HtmlInputElement};

fn first_image(files: FileList) -> Option<File> {
    (0..files.length())
        .filter_map(|i| files.get(i))
        .find(|f| f.type_().starts_with("image/"))
}

#[component]
pub fn UploadArea<F>(
    on_file: F,
    #[prop(into)] file_name: Signal<Option<String>>,
) -> impl IntoView
where
    F: Fn(File) + 'static + Clone,
{
    let (is_dragover, set_is_dragover) = signal(false);

    let on_drop = {
        let on_file = on_file.clone();
        move |ev: DragEvent| {
            ev.prevent_default();
            set_is_dragover.set(false);
            if let Some(file) = ev
                .data_transfer()
                .and_then(|dt| dt.files())
                .and_then(first_image)
            {
                on_file(file);
            }
        }
    };

    let on_dragover = move |ev: DragEvent| {
        ev.prevent_default();
        set_is_dragover.set(true);
    };

    let on_dragleave = move |_: DragEvent| {
        set_is_dragover.set(false);
    };

    // 解析中でも選び直せる
    let on_click = move |_| {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let Some(input) = document
            .create_element("input")
            .ok()
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        else {
            return;
        };
        input.set_type("file");
        input.set_accept("image/*");

        let on_file = on_file.clone();
        let picker = input.clone();
        let on_change = Closure::once_into_js(move |_: web_sys::Event| {
            if let Some(file) = picker.files().and_then(first_image) {
                on_file(file);
            }
        });
        input.set_onchange(Some(on_change.unchecked_ref()));
        input.click();
    };

    view! {
        <div
            class=move || if is_dragover.get() { "upload-area dragover" } else { "upload-area" }
            on:drop=on_drop
            on:dragover=on_dragover
            on:dragleave=on_dragleave
            on:click=on_click
        >
            <div class="upload-icon">"🔬"</div>
            {move || match file_name.get() {
                Some(name) => view! { <p>{name}</p> }.into_any(),
                None => view! { <p>"画像をドラッグ&ドロップ または クリックして選択"</p> }.into_any(),
            }}
            <p class="text-muted">"対応形式: JPEG, PNG, BMP"</p>
        </div>
    }
}
