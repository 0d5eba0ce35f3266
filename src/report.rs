//! 解析結果の表示と保存

use crate::error::{Result, SmearError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use smear_vision_common::segmentation::significant_classes;
use smear_vision_common::types::format_percent;
use smear_vision_common::{CategorizeResponse, DetectResponse};
use std::path::Path;

/// 検出結果を行単位で整形（件数行 + 1検出1行）
pub fn detection_lines(resp: &DetectResponse) -> Vec<String> {
    let stats = &resp.detection_stats;
    let mut lines = vec![format!(
        "検出数: {}  平均信頼度: {}  閾値: {:.2}",
        stats.total_count,
        format_percent(stats.average_confidence),
        stats.confidence_threshold
    )];
    for (idx, det) in resp.detections.iter().enumerate() {
        lines.push(format!(
            "  #{:<3} {:<16} {:>6}  [{:.0}, {:.0}, {:.0}, {:.0}]",
            idx + 1,
            det.class_name,
            det.confidence_label(),
            det.bbox.x1,
            det.bbox.y1,
            det.bbox.x2,
            det.bbox.y2
        ));
    }
    lines
}

/// セグメンテーション結果を整形（表示条件を満たすクラスのみ）
pub fn categorize_lines(resp: &CategorizeResponse) -> Vec<String> {
    let seg = &resp.segmentation_results;
    let mut lines = vec![format!(
        "主要クラス: {} ({} / 面積 {:.2}%)  全体信頼度: {}",
        if seg.dominant_class.is_empty() { "-" } else { seg.dominant_class.as_str() },
        format_percent(seg.dominant_confidence),
        seg.dominant_percentage,
        format_percent(seg.overall_confidence)
    )];

    let classes = significant_classes(seg);
    if classes.is_empty() {
        lines.push("  検出されたクラスはありません".to_string());
    }
    for class in classes {
        let color = resp
            .class_legend
            .as_ref()
            .and_then(|legend| legend.get(class.name))
            .map(String::as_str)
            .unwrap_or("-");
        lines.push(format!(
            "  {:<16} 面積 {:>6.2}%  平均信頼度 {:>6}  画素数 {}  ({})",
            class.name,
            class.stats.percentage,
            format_percent(class.stats.avg_confidence),
            class.stats.pixel_count,
            color
        ));
    }
    lines
}

/// data URI（または素のbase64）を復号
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>> {
    let encoded = match data_url.split_once(',') {
        Some((header, body)) if header.starts_with("data:") => body,
        _ => data_url,
    };
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| SmearError::Backend(format!("画像データを復号できません: {}", e)))
}

/// data URI の画像をファイルに保存
pub fn save_data_url(data_url: &str, path: &Path) -> Result<()> {
    if data_url.is_empty() {
        return Err(SmearError::Backend("応答に画像が含まれていません".into()));
    }
    let bytes = decode_data_url(data_url)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

/// JSONとして保存
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// バッチ処理1件分
#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub file_name: String,
    pub path: String,
    pub total_count: usize,
    pub average_confidence: f64,
    pub class_counts: std::collections::BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchEntry {
    pub fn from_response(file_name: &str, path: &Path, resp: &DetectResponse) -> Self {
        let mut class_counts = std::collections::BTreeMap::new();
        for det in &resp.detections {
            *class_counts.entry(det.class_name.clone()).or_insert(0) += 1;
        }
        Self {
            file_name: file_name.to_string(),
            path: path.display().to_string(),
            total_count: resp.detection_stats.total_count,
            average_confidence: resp.detection_stats.average_confidence,
            class_counts,
            error: None,
        }
    }

    pub fn failed(file_name: &str, path: &Path, message: String) -> Self {
        Self {
            file_name: file_name.to_string(),
            path: path.display().to_string(),
            total_count: 0,
            average_confidence: 0.0,
            class_counts: Default::default(),
            error: Some(message),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub generated_at: String,
    pub confidence: f64,
    pub images: usize,
    pub failed: usize,
    pub total_detections: usize,
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn new(confidence: f64, entries: Vec<BatchEntry>) -> Self {
        Self {
            generated_at: chrono::Local::now().to_rfc3339(),
            confidence,
            images: entries.len(),
            failed: entries.iter().filter(|e| e.error.is_some()).count(),
            total_detections: entries.iter().map(|e| e.total_count).sum(),
            entries,
        }
    }
}
