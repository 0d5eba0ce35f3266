//! 検出結果の一覧

use leptos::prelude::*;
use smear_vision_common::types::format_percent;
use smear_vision_common::DetectResponse;

/// 件数と、1検出につき1行
#[component]
pub fn DetectionList(response: DetectResponse) -> impl IntoView {
    let stats = response.detection_stats.clone();
    view! {
        <div class="detection-list">
            <div class="stats-row">
                <div class="stat">
                    <span class="stat-label">"検出数"</span>
                    <span class="stat-value total-count">{stats.total_count}</span>
                </div>
                <div class="stat">
                    <span class="stat-label">"平均信頼度"</span>
                    <span class="stat-value">{format_percent(stats.average_confidence)}</span>
                </div>
                <div class="stat">
                    <span class="stat-label">"閾値"</span>
                    <span class="stat-value">{format!("{:.2}", stats.confidence_threshold)}</span>
                </div>
            </div>
            <ul class="detections">
                {response
                    .detections
                    .into_iter()
                    .enumerate()
                    .map(|(idx, det)| {
                        view! {
                            <li class="detection-item">
                                <span class="detection-index">{format!("#{}", idx + 1)}</span>
                                <span class="detection-class">{det.class_name.clone()}</span>
                                <span class="detection-confidence">{det.confidence_label()}</span>
                            </li>
                        }
                    })
                    .collect_view()}
            </ul>
        </div>
    }
}
