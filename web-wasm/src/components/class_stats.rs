//! セグメンテーションのクラス別統計

use leptos::prelude::*;
use smear_vision_common::palette::{class_color, named_color, to_css_hex};
use smear_vision_common::types::format_percent;
use smear_vision_common::{significant_classes, CategorizeResponse};

#[component]
pub fn ClassStats(response: CategorizeResponse) -> impl IntoView {
    let seg = &response.segmentation_results;
    let rows: Vec<_> = significant_classes(seg)
        .into_iter()
        .map(|class| {
            // 凡例の色名を優先し、なければクラスIDの固定色
            let color = response
                .class_legend
                .as_ref()
                .and_then(|legend| legend.get(class.name))
                .and_then(|name| named_color(name))
                .unwrap_or_else(|| class_color(class.stats.class_id.min(255) as u8));
            (
                class.name.to_string(),
                to_css_hex(color),
                format!("{:.2}%", class.stats.percentage),
                format_percent(class.stats.avg_confidence),
            )
        })
        .collect();
    let dominant = if seg.dominant_class.is_empty() {
        "-".to_string()
    } else {
        seg.dominant_class.clone()
    };
    let overall = format_percent(seg.overall_confidence);
    let has_rows = !rows.is_empty();

    view! {
        <div class="class-stats">
            <div class="stats-row">
                <div class="stat">
                    <span class="stat-label">"主要クラス"</span>
                    <span class="stat-value">{dominant}</span>
                </div>
                <div class="stat">
                    <span class="stat-label">"全体信頼度"</span>
                    <span class="stat-value">{overall}</span>
                </div>
            </div>
            <Show
                when=move || has_rows
                fallback=|| view! { <p class="text-muted">"検出されたクラスはありません"</p> }
            >
                <table class="class-table">
                    <thead>
                        <tr><th>"クラス"</th><th>"面積"</th><th>"平均信頼度"</th></tr>
                    </thead>
                    <tbody>
                        {rows
                            .clone()
                            .into_iter()
                            .map(|(name, color, percentage, confidence)| {
                                view! {
                                    <tr>
                                        <td>
                                            <span class="swatch" style=format!("background: {}", color)></span>
                                            {name}
                                        </td>
                                        <td>{percentage}</td>
                                        <td>{confidence}</td>
                                    </tr>
                                }
                            })
                            .collect_view()}
                    </tbody>
                </table>
            </Show>
        </div>
    }
}
