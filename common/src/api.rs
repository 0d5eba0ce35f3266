//! バックエンドのエンドポイント定義

use crate::error::{Error, Result};
use crate::session::StreamParams;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

pub const DEFAULT_API_BASE: &str = "http://localhost:5000";

/// multipart のフィールド名
pub const FIELD_IMAGE: &str = "image";
pub const FIELD_CONFIDENCE: &str = "confidence";

/// 配信モデルの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    #[default]
    Detect,
    Segment,
    Combined,
}

impl StreamKind {
    pub const ALL: [StreamKind; 3] = [StreamKind::Detect, StreamKind::Segment, StreamKind::Combined];

    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Detect => "detect",
            StreamKind::Segment => "segment",
            StreamKind::Combined => "combined",
        }
    }

    /// マスクを要求すべきか
    pub fn wants_mask(&self) -> bool {
        !matches!(self, StreamKind::Detect)
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StreamKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "detect" | "detection" => Ok(StreamKind::Detect),
            "segment" | "segmentation" => Ok(StreamKind::Segment),
            "combined" | "both" => Ok(StreamKind::Combined),
            _ => Err(format!("Unknown stream type: {}. Use detect, segment, or combined", s)),
        }
    }
}

/// ベースURLから各エンドポイントを組み立てる
#[derive(Debug, Clone, PartialEq)]
pub struct ApiEndpoints {
    base: Url,
}

impl ApiEndpoints {
    pub fn new(base: &str) -> Result<Self> {
        let mut base = Url::parse(base.trim())
            .map_err(|e| Error::Config(format!("invalid backend URL '{}': {}", base, e)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "backend URL must be http(s): {}",
                base
            )));
        }
        // join() が最後のセグメントを置き換えないように
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base })
    }

    fn join(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| Error::Config(format!("invalid endpoint '{}': {}", path, e)))
    }

    pub fn base(&self) -> &str {
        self.base.as_str()
    }

    pub fn detect_url(&self) -> Result<String> {
        Ok(self.join("api/detect")?.to_string())
    }

    pub fn categorize_url(&self) -> Result<String> {
        Ok(self.join("api/categorize")?.to_string())
    }

    /// `GET /api/stream/{kind}?source&conf&alpha`（MJPEG）
    pub fn stream_url(&self, params: &StreamParams) -> Result<String> {
        let mut url = self.join(&format!("api/stream/{}", params.kind.as_str()))?;
        url.query_pairs_mut()
            .append_pair("source", &params.source.to_string())
            .append_pair("conf", &params.conf.to_string())
            .append_pair("alpha", &params.alpha.to_string());
        Ok(url.to_string())
    }

    /// Socket.IO の WebSocket 接続先
    pub fn socket_url(&self) -> Result<String> {
        let mut url = self.join("socket.io/")?;
        let scheme = if self.base.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| Error::Config(format!("cannot derive websocket URL from {}", self.base)))?;
        url.query_pairs_mut()
            .append_pair("EIO", "4")
            .append_pair("transport", "websocket");
        Ok(url.to_string())
    }
}
