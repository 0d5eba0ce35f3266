//! 推論バックエンドのHTTPクライアント
//!
//! - `POST /api/detect`（multipart: image, confidence）
//! - `POST /api/categorize`（multipart: image）
//! - `GET /api/stream/{kind}`（MJPEG）

use crate::config::Config;
use crate::error::{Result, SmearError};
use image::{imageops::FilterType, ImageFormat};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use smear_vision_common::api::{FIELD_CONFIDENCE, FIELD_IMAGE};
use smear_vision_common::mjpeg::{boundary_from_content_type, MjpegSplitter};
use smear_vision_common::types::BackendReply;
use smear_vision_common::{ApiEndpoints, CategorizeResponse, DetectResponse, StreamParams};
use std::collections::VecDeque;
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

/// 送信する画像
#[derive(Debug, Clone)]
pub struct UploadImage {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
    /// 縮小して再エンコードしたか
    pub resized: bool,
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("bmp") => "image/bmp",
        _ => "image/jpeg",
    }
}

/// 長辺が `max_size` を超える画像はJPEGに縮小する
pub fn prepare_upload(path: &Path, max_size: u32) -> Result<UploadImage> {
    if !path.is_file() {
        return Err(SmearError::FileNotFound(path.display().to_string()));
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "image.jpg".to_string());

    let (width, height) = image::image_dimensions(path)?;
    if max_size == 0 || width.max(height) <= max_size {
        return Ok(UploadImage {
            file_name,
            mime: mime_for(path),
            bytes: std::fs::read(path)?,
            resized: false,
        });
    }

    tracing::debug!(%file_name, width, height, max_size, "downscaling before upload");
    let img = image::open(path)?;
    let resized = img.resize(max_size, max_size, FilterType::Triangle).to_rgb8();
    let mut bytes = Vec::new();
    resized.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string());
    Ok(UploadImage {
        file_name: format!("{}.jpg", stem),
        mime: "image/jpeg",
        bytes,
        resized: true,
    })
}

pub struct BackendClient {
    http: reqwest::Client,
    endpoints: ApiEndpoints,
    max_image_size: u32,
}

impl BackendClient {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base(&config.api_base(), config.timeout_seconds, config.max_image_size)
    }

    pub fn with_base(base: &str, timeout_seconds: u64, max_image_size: u32) -> Result<Self> {
        let endpoints = ApiEndpoints::new(base)?;
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(timeout_seconds.max(1)))
            .build()?;
        Ok(Self {
            http,
            endpoints,
            max_image_size,
        })
    }

    pub fn endpoints(&self) -> &ApiEndpoints {
        &self.endpoints
    }

    fn image_part(&self, path: &Path) -> Result<Part> {
        let upload = prepare_upload(path, self.max_image_size)?;
        Ok(Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(upload.mime)?)
    }

    /// 物体検出
    pub async fn detect(&self, path: &Path, confidence: f64) -> Result<DetectResponse> {
        let form = Form::new()
            .part(FIELD_IMAGE, self.image_part(path)?)
            .text(FIELD_CONFIDENCE, confidence.to_string());
        let url = self.endpoints.detect_url()?;
        tracing::debug!(%url, path = %path.display(), confidence, "detect request");
        self.post_multipart(&url, form).await
    }

    /// セグメンテーション（分類）
    pub async fn categorize(&self, path: &Path) -> Result<CategorizeResponse> {
        let form = Form::new().part(FIELD_IMAGE, self.image_part(path)?);
        let url = self.endpoints.categorize_url()?;
        tracing::debug!(%url, path = %path.display(), "categorize request");
        self.post_multipart(&url, form).await
    }

    async fn post_multipart<T>(&self, url: &str, form: Form) -> Result<T>
    where
        T: DeserializeOwned + BackendReply,
    {
        let response = self.http.post(url).multipart(form).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        match serde_json::from_slice::<T>(&body) {
            Ok(reply) => Ok(reply.into_result()?),
            Err(_) if !status.is_success() => Err(SmearError::Backend(format!("HTTP {}", status))),
            Err(e) => Err(SmearError::JsonParse(e)),
        }
    }

    /// MJPEG配信を開く
    pub async fn open_stream(&self, params: &StreamParams) -> Result<FrameStream> {
        let url = self.endpoints.stream_url(params)?;
        tracing::debug!(%url, "opening mjpeg stream");

        // 配信は終わらないので全体タイムアウトは外す
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let response = client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(SmearError::Stream(format!("HTTP {}", response.status())));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let boundary = boundary_from_content_type(&content_type)
            .ok_or_else(|| SmearError::Stream(format!("not a multipart stream: {}", content_type)))?;
        tracing::debug!(%boundary, "mjpeg stream opened");

        Ok(FrameStream {
            response,
            splitter: MjpegSplitter::new(&boundary),
            pending: VecDeque::new(),
        })
    }
}

/// MJPEG配信から1枚ずつJPEGを取り出す
pub struct FrameStream {
    response: reqwest::Response,
    splitter: MjpegSplitter,
    pending: VecDeque<Vec<u8>>,
}

impl FrameStream {
    /// 次のJPEG。配信が終わったら `None`
    pub async fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Ok(Some(frame));
            }
            match self.response.chunk().await? {
                Some(chunk) => self.pending.extend(self.splitter.push(&chunk)),
                // 終端の境界がないまま閉じた最後のパート
                None => return Ok(self.splitter.finish()),
            }
        }
    }

    /// 壊れたパートとして捨てたバイト数
    pub fn discarded_bytes(&self) -> u64 {
        self.splitter.discarded_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> std::path::PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(width, height, Rgb([200, 30, 30]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_small_image_sent_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "small.png", 32, 16);
        let upload = prepare_upload(&path, 1920).unwrap();
        assert!(!upload.resized);
        assert_eq!(upload.mime, "image/png");
        assert_eq!(upload.file_name, "small.png");
        assert_eq!(upload.bytes, std::fs::read(&path).unwrap());
    }

    #[test]
    fn test_large_image_downscaled_to_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "large.png", 400, 200);
        let upload = prepare_upload(&path, 100).unwrap();
        assert!(upload.resized);
        assert_eq!(upload.mime, "image/jpeg");
        assert_eq!(upload.file_name, "large.jpg");
        let decoded = image::load_from_memory(&upload.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (100, 50));
    }

    #[test]
    fn test_missing_file() {
        let result = prepare_upload(Path::new("/no/such/smear.jpg"), 100);
        assert!(matches!(result, Err(SmearError::FileNotFound(_))));
    }
}
