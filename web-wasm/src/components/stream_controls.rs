//! 配信パラメータの入力欄

use leptos::prelude::*;
use smear_vision_common::StreamKind;

fn kind_label(kind: StreamKind) -> &'static str {
    match kind {
        StreamKind::Detect => "物体検出",
        StreamKind::Segment => "セグメンテーション",
        StreamKind::Combined => "検出 + セグメンテーション",
    }
}

#[component]
pub fn StreamControls(
    kind: RwSignal<StreamKind>,
    conf: RwSignal<f64>,
    alpha: RwSignal<f64>,
    /// カメラ送信ではソース欄を出さない
    #[prop(optional)]
    source: Option<RwSignal<String>>,
    #[prop(into)] disabled: Signal<bool>,
) -> impl IntoView {
    view! {
        <div class="settings-grid stream-controls">
            <div class="form-group">
                <label for="stream-kind">"モデル"</label>
                <select
                    id="stream-kind"
                    prop:disabled=move || disabled.get()
                    on:change=move |ev| {
                        if let Ok(value) = event_target_value(&ev).parse::<StreamKind>() {
                            kind.set(value);
                        }
                    }
                >
                    {StreamKind::ALL
                        .into_iter()
                        .map(|k| {
                            view! {
                                <option value=k.as_str() selected=move || kind.get() == k>
                                    {kind_label(k)}
                                </option>
                            }
                        })
                        .collect_view()}
                </select>
            </div>

            {source.map(|source| view! {
                <div class="form-group">
                    <label for="stream-source">"ソース（カメラ番号 / 動画パス）"</label>
                    <input
                        type="text"
                        id="stream-source"
                        prop:disabled=move || disabled.get()
                        prop:value=move || source.get()
                        on:input=move |ev| source.set(event_target_value(&ev))
                    />
                </div>
            })}

            <div class="form-group">
                <label for="stream-conf">{move || format!("信頼度の閾値: {:.2}", conf.get())}</label>
                <input
                    type="range"
                    id="stream-conf"
                    min="0.05"
                    max="0.95"
                    step="0.05"
                    prop:disabled=move || disabled.get()
                    prop:value=move || conf.get().to_string()
                    on:input=move |ev| {
                        if let Ok(value) = event_target_value(&ev).parse::<f64>() {
                            conf.set(value);
                        }
                    }
                />
            </div>

            <Show when=move || kind.get().wants_mask()>
                <div class="form-group">
                    <label for="stream-alpha">{move || format!("マスク不透明度: {:.2}", alpha.get())}</label>
                    <input
                        type="range"
                        id="stream-alpha"
                        min="0"
                        max="1"
                        step="0.05"
                        prop:value=move || alpha.get().to_string()
                        on:input=move |ev| {
                            if let Ok(value) = event_target_value(&ev).parse::<f64>() {
                                alpha.set(value);
                            }
                        }
                    />
                </div>
            </Show>
        </div>
    }
}
