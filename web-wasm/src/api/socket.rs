//! Socket.IO クライアント（gloo の WebSocket 上）
//!
//! 受信は1本の非同期ループで Engine.IO / Socket.IO を復号してイベントとして渡す。
//! 送信はチャネルに積み、書き込みループが順に送る。

use futures::channel::mpsc::{unbounded, UnboundedSender};
use futures::{SinkExt, StreamExt};
use gloo::net::websocket::{futures::WebSocket, Message, WebSocketError};
use smear_vision_common::socketio::{EnginePacket, SocketPacket};
use smear_vision_common::{ClientEvent, ServerEvent};
use std::cell::Cell;
use std::rc::Rc;

/// ページ側に通知する出来事
#[derive(Debug, Clone)]
pub enum SocketEvent {
    /// 名前空間への接続完了
    Connected,
    /// 切断（理由があれば付く）
    Disconnected(Option<String>),
    Server(ServerEvent),
}

pub struct SocketClient {
    outgoing: UnboundedSender<String>,
    open: Rc<Cell<bool>>,
    alive: Rc<Cell<bool>>,
}

fn queue(outgoing: &UnboundedSender<String>, packet: &EnginePacket) -> Result<(), String> {
    let text = packet.encode().map_err(|e| e.to_string())?;
    outgoing
        .unbounded_send(text)
        .map_err(|_| "接続が閉じています".to_string())
}

struct Reader<F> {
    outgoing: UnboundedSender<String>,
    open: Rc<Cell<bool>>,
    alive: Rc<Cell<bool>>,
    on_event: F,
}

impl<F: Fn(SocketEvent)> Reader<F> {
    fn notify(&self, event: SocketEvent) {
        // クライアント破棄後は呼ばない
        if self.alive.get() {
            (self.on_event)(event);
        }
    }

    fn handle(&self, text: &str) {
        match EnginePacket::decode(text) {
            Ok(EnginePacket::Open(handshake)) => {
                gloo::console::debug!(format!("engine open sid={}", handshake.sid));
                self.open.set(true);
                let connect = EnginePacket::Message(SocketPacket::connect());
                if let Err(e) = queue(&self.outgoing, &connect) {
                    self.notify(SocketEvent::Disconnected(Some(e)));
                }
            }
            Ok(EnginePacket::Ping) => {
                let _ = queue(&self.outgoing, &EnginePacket::Pong);
            }
            Ok(EnginePacket::Message(SocketPacket::Connect(_))) => {
                self.notify(SocketEvent::Connected);
            }
            Ok(EnginePacket::Message(SocketPacket::Event { name, data, .. })) => {
                match ServerEvent::from_event(&name, data) {
                    Ok(event) => self.notify(SocketEvent::Server(event)),
                    Err(e) => gloo::console::warn!(format!("bad '{}' payload: {}", name, e)),
                }
            }
            Ok(EnginePacket::Message(SocketPacket::ConnectError(data))) => {
                self.notify(SocketEvent::Disconnected(Some(data.to_string())));
            }
            Ok(EnginePacket::Message(SocketPacket::Disconnect)) | Ok(EnginePacket::Close) => {
                self.notify(SocketEvent::Disconnected(None));
            }
            Ok(_) => {}
            Err(e) => gloo::console::warn!(format!("undecodable packet: {}", e)),
        }
    }
}

impl SocketClient {
    /// 接続を開始する。`on_event` は以後のすべての通知を受ける
    pub fn connect<F>(url: &str, on_event: F) -> Result<Self, String>
    where
        F: Fn(SocketEvent) + 'static,
    {
        let ws = WebSocket::open(url).map_err(|e| format!("WebSocket を開けません: {}", e))?;
        let (mut sink, mut stream) = ws.split();
        let (outgoing, mut outgoing_rx) = unbounded::<String>();
        let open = Rc::new(Cell::new(false));
        let alive = Rc::new(Cell::new(true));

        wasm_bindgen_futures::spawn_local(async move {
            while let Some(text) = outgoing_rx.next().await {
                if let Err(e) = sink.send(Message::Text(text)).await {
                    gloo::console::warn!(format!("socket send: {}", e));
                    break;
                }
            }
            // チャネルが閉じたら接続も閉じる
            let _ = sink.close().await;
        });

        let reader = Reader {
            outgoing: outgoing.clone(),
            open: open.clone(),
            alive: alive.clone(),
            on_event,
        };
        wasm_bindgen_futures::spawn_local(async move {
            let mut reason = None;
            while let Some(message) = stream.next().await {
                match message {
                    Ok(Message::Text(text)) => reader.handle(&text),
                    // バイナリ添付は扱わない
                    Ok(Message::Bytes(_)) => {}
                    Err(WebSocketError::ConnectionClose(ev)) => {
                        if !ev.was_clean {
                            reason = Some(format!("接続が切れました (code {})", ev.code));
                        }
                        break;
                    }
                    Err(e) => gloo::console::warn!(format!("socket error: {}", e)),
                }
            }
            reader.open.set(false);
            reader.notify(SocketEvent::Disconnected(reason));
        });

        Ok(Self {
            outgoing,
            open,
            alive,
        })
    }

    pub fn emit(&self, event: &ClientEvent) -> Result<(), String> {
        if !self.is_open() {
            return Err("サーバーに接続されていません".to_string());
        }
        let packet = event.to_packet().map_err(|e| e.to_string())?;
        queue(&self.outgoing, &EnginePacket::Message(packet))
    }

    pub fn is_open(&self) -> bool {
        self.open.get()
    }
}

impl Drop for SocketClient {
    fn drop(&mut self) {
        self.alive.set(false);
        if self.is_open() {
            let _ = queue(
                &self.outgoing,
                &EnginePacket::Message(SocketPacket::Disconnect),
            );
        }
        // 積んだ分を送り終えたら書き込みループが接続を閉じる
        self.outgoing.close_channel();
    }
}
