//! リアルタイム配信セッションの状態機械
//!
//! `Disconnected → Connected → Starting → Streaming → Connected → Disconnected`
//!
//! フレームは最新の1枚だけ保持し、届くたびに丸ごと置き換える。

use crate::api::StreamKind;
use crate::events::ClientEvent;
use crate::fps::FpsCounter;
use crate::types::{DetectionResultEvent, FrameMetadata, StreamFrame, StreamStarted};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
    /// start_stream 送信済み、バックエンドの応答待ち
    Starting,
    Streaming,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connected => "connected",
            SessionState::Starting => "starting",
            SessionState::Streaming => "streaming",
        }
    }
}

/// カメラ番号またはファイルパス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamSource {
    Camera(u32),
    Path(String),
}

impl StreamSource {
    /// 数字だけならカメラ番号として扱う
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        match trimmed.parse::<u32>() {
            Ok(index) => StreamSource::Camera(index),
            Err(_) => StreamSource::Path(trimmed.to_string()),
        }
    }
}

impl Default for StreamSource {
    fn default() -> Self {
        StreamSource::Camera(0)
    }
}

impl fmt::Display for StreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamSource::Camera(index) => write!(f, "{}", index),
            StreamSource::Path(path) => write!(f, "{}", path),
        }
    }
}

/// start_stream で送るパラメータ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamParams {
    #[serde(rename = "type")]
    pub kind: StreamKind,
    pub source: StreamSource,
    pub conf: f64,
    pub alpha: f64,
}

impl Default for StreamParams {
    fn default() -> Self {
        Self {
            kind: StreamKind::Detect,
            source: StreamSource::default(),
            conf: 0.25,
            alpha: 0.5,
        }
    }
}

/// 配信開始の確認方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartAck {
    /// `stream_started` を待つ
    Explicit,
    /// 最初のフレームを開始とみなす
    FirstFrame,
}

#[derive(Debug, Clone)]
pub struct StreamSession {
    state: SessionState,
    ack: StartAck,
    params: Option<StreamParams>,
    info: Option<StreamStarted>,
    frame: Option<StreamFrame>,
    metadata: Option<FrameMetadata>,
    frames_received: u64,
    fps: FpsCounter,
    error: Option<String>,
}

impl StreamSession {
    pub fn new(ack: StartAck, fps: FpsCounter) -> Self {
        Self {
            state: SessionState::Disconnected,
            ack,
            params: None,
            info: None,
            frame: None,
            metadata: None,
            frames_received: 0,
            fps,
            error: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state != SessionState::Disconnected
    }

    pub fn is_streaming(&self) -> bool {
        self.state == SessionState::Streaming
    }

    pub fn params(&self) -> Option<&StreamParams> {
        self.params.as_ref()
    }

    pub fn info(&self) -> Option<&StreamStarted> {
        self.info.as_ref()
    }

    pub fn frame(&self) -> Option<&StreamFrame> {
        self.frame.as_ref()
    }

    pub fn metadata(&self) -> Option<&FrameMetadata> {
        self.metadata.as_ref()
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    pub fn fps(&self) -> f64 {
        self.fps.fps()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn on_connected(&mut self) {
        if self.state == SessionState::Disconnected {
            self.state = SessionState::Connected;
        }
        self.error = None;
    }

    /// 切断時は配信も暗黙に終了する
    pub fn on_disconnected(&mut self) {
        self.state = SessionState::Disconnected;
        self.clear_stream();
    }

    /// 接続済みかつ待機中なら start_stream を返す
    pub fn request_start(&mut self, params: StreamParams) -> Option<ClientEvent> {
        if self.state != SessionState::Connected {
            return None;
        }
        self.error = None;
        self.params = Some(params.clone());
        self.state = SessionState::Starting;
        Some(ClientEvent::StartStream(params))
    }

    pub fn on_stream_started(&mut self, info: StreamStarted) {
        if matches!(self.state, SessionState::Starting | SessionState::Streaming) {
            self.info = Some(info);
            self.state = SessionState::Streaming;
        }
    }

    fn accept_frame(&mut self) -> bool {
        match self.state {
            SessionState::Streaming => true,
            SessionState::Starting if self.ack == StartAck::FirstFrame => {
                self.state = SessionState::Streaming;
                true
            }
            _ => false,
        }
    }

    /// `frame` イベント。配信中でなければ無視して false
    pub fn on_frame(&mut self, frame: StreamFrame, now_ms: f64) -> bool {
        if !self.accept_frame() {
            return false;
        }
        self.frames_received += 1;
        self.metadata = Some(frame.metadata.clone());
        self.frame = Some(frame);
        self.fps.record(now_ms);
        true
    }

    /// `detection_result` イベント（カメラ送信方式）
    pub fn on_detection_result(&mut self, event: DetectionResultEvent, now_ms: f64) -> bool {
        if !self.accept_frame() {
            return false;
        }
        self.frames_received += 1;
        self.metadata = Some(event.result);
        self.fps.record(now_ms);
        true
    }

    /// 配信中なら stop_stream を返し、表示中のフレームと計測値を破棄する
    pub fn request_stop(&mut self) -> Option<ClientEvent> {
        if !matches!(self.state, SessionState::Starting | SessionState::Streaming) {
            return None;
        }
        self.state = SessionState::Connected;
        self.clear_stream();
        Some(ClientEvent::StopStream)
    }

    pub fn on_stream_stopped(&mut self) {
        if self.state != SessionState::Disconnected {
            self.state = SessionState::Connected;
        }
        self.clear_stream();
    }

    /// 配信エラー。待機状態に戻してメッセージを残す
    pub fn on_stream_error(&mut self, message: impl Into<String>) {
        if self.state != SessionState::Disconnected {
            self.state = SessionState::Connected;
        }
        self.clear_stream();
        self.error = Some(message.into());
    }

    /// 接続エラー
    pub fn on_connection_error(&mut self, message: impl Into<String>) {
        self.on_disconnected();
        self.error = Some(message.into());
    }

    fn clear_stream(&mut self) {
        self.info = None;
        self.frame = None;
        self.metadata = None;
        self.frames_received = 0;
        self.fps.reset();
    }
}
