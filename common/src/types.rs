//! バックエンドとやり取りする型定義
//!
//! CLIとWeb(WASM)で共有される型:
//! - DetectResponse: `POST /api/detect` の応答
//! - CategorizeResponse: `POST /api/categorize` の応答
//! - StreamFrame / FrameMetadata: ストリーミング中に届くフレーム

use crate::error::{Error, Result};
use crate::mask::EncodedMask;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// タイムスタンプ（バックエンドによりISO文字列またはUNIX秒）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Epoch(f64),
    Text(String),
}

impl Default for Timestamp {
    fn default() -> Self {
        Timestamp::Text(String::new())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Epoch(secs) => write!(f, "{:.3}", secs),
            Timestamp::Text(text) => write!(f, "{}", text),
        }
    }
}

/// 入力画像の情報
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub filename: String,
}

/// 画素座標のバウンディングボックス
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BBox {
    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).max(0.0)
    }
}

/// 検出された1物体
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(default)]
    pub id: u32,
    #[serde(rename = "class")]
    pub class_name: String,
    pub confidence: f64,
    pub bbox: BBox,
}

impl Detection {
    /// "87.3%" 形式の信頼度
    pub fn confidence_label(&self) -> String {
        format_percent(self.confidence)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionStats {
    pub total_count: usize,
    pub average_confidence: f64,
    pub confidence_threshold: f64,
}

/// `POST /api/detect` の応答
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectResponse {
    pub success: bool,
    pub error: Option<String>,
    pub timestamp: Timestamp,
    pub image_info: ImageInfo,
    pub detection_stats: DetectionStats,
    pub detections: Vec<Detection>,
    /// data URI 形式の注釈付き画像
    pub annotated_image: String,
}

impl DetectResponse {
    /// 表示用の注釈付き画像。空なら `None`（クライアント側で枠を描く）
    pub fn annotated_data_url(&self) -> Option<String> {
        (!self.annotated_image.is_empty())
            .then(|| ensure_data_url(&self.annotated_image, "image/jpeg"))
    }
}

/// クラスごとの画素統計
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassStatistics {
    pub class_id: u32,
    pub avg_confidence: f64,
    pub max_confidence: f64,
    pub min_confidence: f64,
    pub percentage: f64,
    pub pixel_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationResults {
    pub class_statistics: BTreeMap<String, ClassStatistics>,
    pub dominant_class: String,
    pub dominant_confidence: f64,
    pub dominant_percentage: f64,
    pub overall_confidence: f64,
}

/// `POST /api/categorize` の応答
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategorizeResponse {
    pub success: bool,
    pub error: Option<String>,
    pub timestamp: Timestamp,
    pub image_info: Option<ImageInfo>,
    /// クラス名 → 色名
    pub class_legend: Option<BTreeMap<String, String>>,
    pub overlay_image: String,
    pub segmentation_results: SegmentationResults,
}

/// `success: false` をエラーに変換する
pub trait BackendReply: Sized {
    fn success(&self) -> bool;
    fn error_message(&self) -> Option<&str>;

    fn into_result(self) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            let message = self
                .error_message()
                .filter(|m| !m.is_empty())
                .unwrap_or("unknown backend error")
                .to_string();
            Err(Error::Backend(message))
        }
    }
}

impl BackendReply for DetectResponse {
    fn success(&self) -> bool {
        self.success
    }

    fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl BackendReply for CategorizeResponse {
    fn success(&self) -> bool {
        self.success
    }

    fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// ストリーム中の1検出（座標は0.0〜1.0に正規化）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamDetection {
    #[serde(rename = "class")]
    pub class_name: String,
    pub confidence: f64,
    /// [x1, y1, x2, y2]
    pub bbox: [f64; 4],
}

/// フレームに付随するモデル別メタデータ
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameMetadata {
    pub detections: Vec<StreamDetection>,
    pub class_percentages: BTreeMap<String, f64>,
    pub mask: Option<EncodedMask>,
    pub inference_ms: Option<f64>,
}

/// `frame` イベント
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamFrame {
    /// data URI または base64 のJPEG
    pub image: String,
    pub frame_number: u64,
    pub timestamp: Timestamp,
    pub metadata: FrameMetadata,
}

/// `stream_started` イベント
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamStarted {
    #[serde(rename = "type")]
    pub model_type: String,
    pub source: serde_json::Value,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

/// `detection_result` イベント（カメラ送信方式の応答）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionResultEvent {
    pub frame_id: u64,
    #[serde(rename = "type")]
    pub model_type: String,
    pub timestamp: Timestamp,
    pub result: FrameMetadata,
}

/// 0.0〜1.0 の値を "12.3%" 形式に整形
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

/// data URI を付与する（既に data: で始まる場合はそのまま）
pub fn ensure_data_url(image: &str, mime: &str) -> String {
    if image.starts_with("data:") {
        image.to_string()
    } else {
        format!("data:{};base64,{}", mime, image)
    }
}
