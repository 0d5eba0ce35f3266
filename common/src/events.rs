//! 双方向チャネルのイベント名とペイロード

use crate::api::StreamKind;
use crate::error::Result;
use crate::session::StreamParams;
use crate::socketio::SocketPacket;
use crate::types::{DetectionResultEvent, StreamFrame, StreamStarted};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `process_frame` のペイロード（カメラ送信方式）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessFrame {
    /// JPEG の data URL
    pub frame: String,
    #[serde(rename = "type")]
    pub kind: StreamKind,
    pub conf: f64,
    pub return_mask: bool,
    pub frame_id: u64,
}

/// クライアント → バックエンド
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    StartStream(StreamParams),
    StopStream,
    ProcessFrame(ProcessFrame),
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::StartStream(_) => "start_stream",
            ClientEvent::StopStream => "stop_stream",
            ClientEvent::ProcessFrame(_) => "process_frame",
        }
    }

    pub fn payload(&self) -> Result<Value> {
        Ok(match self {
            ClientEvent::StartStream(params) => serde_json::to_value(params)?,
            ClientEvent::StopStream => Value::Null,
            ClientEvent::ProcessFrame(frame) => serde_json::to_value(frame)?,
        })
    }

    pub fn to_packet(&self) -> Result<SocketPacket> {
        Ok(SocketPacket::event(self.name(), self.payload()?))
    }
}

/// バックエンド → クライアント
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    Connected(Value),
    StreamStarted(StreamStarted),
    StreamStopped,
    Frame(Box<StreamFrame>),
    DetectionResult(Box<DetectionResultEvent>),
    StreamError(String),
    Error(String),
    Unknown(String),
}

impl ServerEvent {
    pub fn from_event(name: &str, data: Value) -> Result<Self> {
        Ok(match name {
            "connected" => ServerEvent::Connected(data),
            "stream_started" => ServerEvent::StreamStarted(serde_json::from_value(data)?),
            "stream_stopped" => ServerEvent::StreamStopped,
            "frame" => ServerEvent::Frame(Box::new(serde_json::from_value(data)?)),
            "detection_result" => ServerEvent::DetectionResult(Box::new(serde_json::from_value(data)?)),
            "stream_error" => ServerEvent::StreamError(error_text(&data)),
            "error" => ServerEvent::Error(error_text(&data)),
            other => ServerEvent::Unknown(other.to_string()),
        })
    }
}

/// `{error}` / `{message}` / 文字列 のいずれでも文言を取り出す
fn error_text(data: &Value) -> String {
    match data {
        Value::String(text) => text.clone(),
        Value::Object(map) => map
            .get("error")
            .or_else(|| map.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| data.to_string()),
        Value::Null => "unknown error".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::StreamSource;
    use serde_json::json;

    #[test]
    fn test_start_stream_payload() {
        let event = ClientEvent::StartStream(StreamParams {
            kind: StreamKind::Combined,
            source: StreamSource::Camera(1),
            conf: 0.3,
            alpha: 0.5,
        });
        assert_eq!(event.name(), "start_stream");
        assert_eq!(
            event.payload().unwrap(),
            json!({"type": "combined", "source": 1, "conf": 0.3, "alpha": 0.5})
        );
    }

    #[test]
    fn test_process_frame_payload() {
        let event = ClientEvent::ProcessFrame(ProcessFrame {
            frame: "data:image/jpeg;base64,AA".into(),
            kind: StreamKind::Segment,
            conf: 0.25,
            return_mask: true,
            frame_id: 9,
        });
        let payload = event.payload().unwrap();
        assert_eq!(payload["type"], "segment");
        assert_eq!(payload["return_mask"], true);
        assert_eq!(payload["frame_id"], 9);
    }

    #[test]
    fn test_parse_frame_event() {
        let data = json!({
            "image": "AAAA",
            "frame_number": 17,
            "timestamp": 1700000000.25,
            "metadata": {
                "detections": [{"class": "RBC", "confidence": 0.9, "bbox": [0.1, 0.2, 0.3, 0.4]}],
                "class_percentages": {"RBC": 12.5},
                "mask": {"encoding": "rle", "width": 2, "height": 1, "runs": [[1, 2]]}
            }
        });
        match ServerEvent::from_event("frame", data).unwrap() {
            ServerEvent::Frame(frame) => {
                assert_eq!(frame.frame_number, 17);
                assert_eq!(frame.metadata.detections[0].bbox, [0.1, 0.2, 0.3, 0.4]);
                assert!(frame.metadata.mask.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_detection_result() {
        let data = json!({"frame_id": 4, "type": "detect", "timestamp": "t", "result": {"detections": []}});
        match ServerEvent::from_event("detection_result", data).unwrap() {
            ServerEvent::DetectionResult(ev) => assert_eq!(ev.frame_id, 4),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_error_payload_shapes() {
        assert_eq!(
            ServerEvent::from_event("stream_error", json!({"error": "camera busy"})).unwrap(),
            ServerEvent::StreamError("camera busy".into())
        );
        assert_eq!(
            ServerEvent::from_event("error", json!("boom")).unwrap(),
            ServerEvent::Error("boom".into())
        );
        assert_eq!(
            ServerEvent::from_event("error", json!({"message": "bad"})).unwrap(),
            ServerEvent::Error("bad".into())
        );
    }

    #[test]
    fn test_unknown_event() {
        assert_eq!(
            ServerEvent::from_event("heartbeat", Value::Null).unwrap(),
            ServerEvent::Unknown("heartbeat".into())
        );
    }
}
