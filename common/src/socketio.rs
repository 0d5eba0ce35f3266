//! Socket.IO (v5) / Engine.IO (v4) テキストパケットの符号化・復号
//!
//! WebSocket 直結の最小構成:
//! - Engine: `0`open `1`close `2`ping `3`pong `4`message `6`noop
//! - Socket(`4`の中身): `0`connect `1`disconnect `2`event `3`ack `4`connect_error
//!
//! バイナリ添付（`5`/`6`）は扱わない。

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `0` open パケットのハンドシェイク
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    pub ping_interval: u64,
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect(Option<Value>),
    Disconnect,
    Event {
        name: String,
        data: Value,
        ack_id: Option<u64>,
    },
    Ack {
        id: u64,
        data: Value,
    },
    ConnectError(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping,
    Pong,
    Message(SocketPacket),
    Noop,
}

impl EnginePacket {
    pub fn encode(&self) -> Result<String> {
        Ok(match self {
            EnginePacket::Open(handshake) => format!("0{}", serde_json::to_string(handshake)?),
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping => "2".to_string(),
            EnginePacket::Pong => "3".to_string(),
            EnginePacket::Message(packet) => format!("4{}", packet.encode()?),
            EnginePacket::Noop => "6".to_string(),
        })
    }

    pub fn decode(text: &str) -> Result<Self> {
        let mut chars = text.chars();
        let kind = chars
            .next()
            .ok_or_else(|| Error::Protocol("empty engine packet".into()))?;
        let rest = chars.as_str();
        match kind {
            '0' => Ok(EnginePacket::Open(serde_json::from_str(rest)?)),
            '1' => Ok(EnginePacket::Close),
            '2' => Ok(EnginePacket::Ping),
            '3' => Ok(EnginePacket::Pong),
            '4' => Ok(EnginePacket::Message(SocketPacket::decode(rest)?)),
            '6' => Ok(EnginePacket::Noop),
            other => Err(Error::Protocol(format!("unsupported engine packet type '{}'", other))),
        }
    }
}

impl SocketPacket {
    /// デフォルト名前空間への接続要求
    pub fn connect() -> Self {
        SocketPacket::Connect(None)
    }

    pub fn event(name: &str, data: Value) -> Self {
        SocketPacket::Event {
            name: name.to_string(),
            data,
            ack_id: None,
        }
    }

    pub fn encode(&self) -> Result<String> {
        Ok(match self {
            SocketPacket::Connect(None) => "0".to_string(),
            SocketPacket::Connect(Some(auth)) => format!("0{}", serde_json::to_string(auth)?),
            SocketPacket::Disconnect => "1".to_string(),
            SocketPacket::Event { name, data, ack_id } => {
                let mut args = vec![Value::String(name.clone())];
                if !data.is_null() {
                    args.push(data.clone());
                }
                let id = ack_id.map(|id| id.to_string()).unwrap_or_default();
                format!("2{}{}", id, serde_json::to_string(&args)?)
            }
            SocketPacket::Ack { id, data } => {
                format!("3{}{}", id, serde_json::to_string(&vec![data.clone()])?)
            }
            SocketPacket::ConnectError(data) => format!("4{}", serde_json::to_string(data)?),
        })
    }

    pub fn decode(text: &str) -> Result<Self> {
        let mut chars = text.chars();
        let kind = chars
            .next()
            .ok_or_else(|| Error::Protocol("empty socket packet".into()))?;
        let rest = skip_namespace(chars.as_str());

        // ack id は JSON の直前に並ぶ数字
        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        let (id_part, body) = rest.split_at(digits);
        let ack_id = if id_part.is_empty() {
            None
        } else {
            Some(id_part.parse::<u64>().map_err(|e| Error::Protocol(e.to_string()))?)
        };

        match kind {
            '0' => {
                let data = if body.is_empty() {
                    None
                } else {
                    Some(serde_json::from_str(body)?)
                };
                Ok(SocketPacket::Connect(data))
            }
            '1' => Ok(SocketPacket::Disconnect),
            '2' => {
                let args: Vec<Value> = serde_json::from_str(body)?;
                let mut args = args.into_iter();
                let name = match args.next() {
                    Some(Value::String(name)) => name,
                    _ => return Err(Error::Protocol(format!("event without name: {}", body))),
                };
                Ok(SocketPacket::Event {
                    name,
                    data: args.next().unwrap_or(Value::Null),
                    ack_id,
                })
            }
            '3' => {
                let id = ack_id.ok_or_else(|| Error::Protocol("ack without id".into()))?;
                let args: Vec<Value> = serde_json::from_str(body)?;
                Ok(SocketPacket::Ack {
                    id,
                    data: args.into_iter().next().unwrap_or(Value::Null),
                })
            }
            '4' => Ok(SocketPacket::ConnectError(if body.is_empty() {
                Value::Null
            } else {
                serde_json::from_str(body)?
            })),
            '5' | '6' => Err(Error::Protocol("binary packets are not supported".into())),
            other => Err(Error::Protocol(format!("unsupported socket packet type '{}'", other))),
        }
    }
}

/// `/ns,` 形式の名前空間を読み飛ばす
fn skip_namespace(rest: &str) -> &str {
    if rest.starts_with('/') {
        match rest.find(',') {
            Some(idx) => &rest[idx + 1..],
            None => "",
        }
    } else {
        rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_open() {
        let text = r#"0{"sid":"lv_VI97HAXpY6yYWAAAC","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;
        match EnginePacket::decode(text).unwrap() {
            EnginePacket::Open(h) => {
                assert_eq!(h.sid, "lv_VI97HAXpY6yYWAAAC");
                assert_eq!(h.ping_interval, 25000);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_ping_pong() {
        assert_eq!(EnginePacket::decode("2").unwrap(), EnginePacket::Ping);
        assert_eq!(EnginePacket::Pong.encode().unwrap(), "3");
    }

    #[test]
    fn test_encode_connect_and_event() {
        let connect = EnginePacket::Message(SocketPacket::connect());
        assert_eq!(connect.encode().unwrap(), "40");

        let event = EnginePacket::Message(SocketPacket::event("start_stream", json!({"type": "detect"})));
        assert_eq!(event.encode().unwrap(), r#"42["start_stream",{"type":"detect"}]"#);

        let bare = EnginePacket::Message(SocketPacket::event("stop_stream", Value::Null));
        assert_eq!(bare.encode().unwrap(), r#"42["stop_stream"]"#);
    }

    #[test]
    fn test_decode_event() {
        let packet = EnginePacket::decode(r#"42["frame",{"frame_number":3}]"#).unwrap();
        assert_eq!(
            packet,
            EnginePacket::Message(SocketPacket::Event {
                name: "frame".into(),
                data: json!({"frame_number": 3}),
                ack_id: None,
            })
        );
    }

    #[test]
    fn test_decode_event_with_namespace_and_ack() {
        let packet = SocketPacket::decode(r#"2/live,12["connected",{}]"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::Event {
                name: "connected".into(),
                data: json!({}),
                ack_id: Some(12),
            }
        );
    }

    #[test]
    fn test_decode_connect_ack() {
        let packet = SocketPacket::decode(r#"0{"sid":"abc"}"#).unwrap();
        assert_eq!(packet, SocketPacket::Connect(Some(json!({"sid": "abc"}))));
    }

    #[test]
    fn test_decode_connect_error() {
        let packet = SocketPacket::decode(r#"4{"message":"Not authorized"}"#).unwrap();
        assert_eq!(packet, SocketPacket::ConnectError(json!({"message": "Not authorized"})));
    }

    #[test]
    fn test_rejects_binary_and_garbage() {
        assert!(SocketPacket::decode(r#"51-["frame",{"_placeholder":true,"num":0}]"#).is_err());
        assert!(EnginePacket::decode("").is_err());
        assert!(EnginePacket::decode("9").is_err());
        assert!(SocketPacket::decode("2[42]").is_err());
    }
}
