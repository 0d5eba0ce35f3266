//! リアルタイムページ（バックエンドがカメラ/動画を読み、フレームを送ってくる）

use super::{now_ms, open_socket};
use crate::api::socket::{SocketClient, SocketEvent};
use crate::canvas;
use crate::components::{error_banner::ErrorBanner, stream_controls::StreamControls};
use leptos::html::{Canvas, Img};
use leptos::prelude::*;
use smear_vision_common::fps::{LONG_WINDOW, THROTTLE_MS};
use smear_vision_common::session::{StartAck, StreamSource};
use smear_vision_common::types::ensure_data_url;
use smear_vision_common::{
    ClientEvent, FpsCounter, ServerEvent, SessionState, StreamKind, StreamParams, StreamSession,
};

fn new_session() -> StreamSession {
    // stream_started を送らないバックエンドもあるので最初のフレームでも開始とみなす
    StreamSession::new(
        StartAck::FirstFrame,
        FpsCounter::new(LONG_WINDOW).with_throttle(THROTTLE_MS),
    )
}

fn apply(session: RwSignal<StreamSession>, event: SocketEvent) {
    let _ = session.try_update(|s| match event {
        SocketEvent::Connected => s.on_connected(),
        SocketEvent::Disconnected(Some(reason)) => s.on_connection_error(reason),
        SocketEvent::Disconnected(None) => s.on_disconnected(),
        SocketEvent::Server(event) => match event {
            ServerEvent::StreamStarted(info) => s.on_stream_started(info),
            ServerEvent::Frame(frame) => {
                s.on_frame(*frame, now_ms());
            }
            ServerEvent::DetectionResult(result) => {
                s.on_detection_result(*result, now_ms());
            }
            ServerEvent::StreamStopped => s.on_stream_stopped(),
            ServerEvent::StreamError(message) | ServerEvent::Error(message) => {
                s.on_stream_error(message)
            }
            ServerEvent::Connected(_) | ServerEvent::Unknown(_) => {}
        },
    });
}

#[component]
pub fn RealtimePage() -> impl IntoView {
    let session = RwSignal::new(new_session());
    let client = StoredValue::new_local(None::<SocketClient>);

    let kind = RwSignal::new(StreamKind::Detect);
    let source = RwSignal::new("0".to_string());
    let conf = RwSignal::new(0.25);
    let alpha = RwSignal::new(0.5);

    let img_ref = NodeRef::<Img>::new();
    let canvas_ref = NodeRef::<Canvas>::new();

    let connect = move || {
        // 古い接続は破棄してから張り直す
        client.set_value(None);
        session.update(|s| s.on_disconnected());
        match open_socket(move |event| apply(session, event)) {
            Ok(socket) => client.set_value(Some(socket)),
            Err(e) => session.update(|s| s.on_connection_error(e)),
        }
    };
    connect();

    let emit = move |event: ClientEvent| {
        let sent = client.with_value(|c| match c {
            Some(socket) if socket.is_open() => socket.emit(&event),
            _ => Err("サーバーに接続されていません".to_string()),
        });
        if let Err(e) = sent {
            session.update(|s| s.on_stream_error(e));
        }
    };

    let on_start = move |_| {
        let params = StreamParams {
            kind: kind.get_untracked(),
            source: StreamSource::parse(&source.get_untracked()),
            conf: conf.get_untracked(),
            alpha: alpha.get_untracked(),
        };
        if let Some(event) = session.try_update(|s| s.request_start(params)).flatten() {
            emit(event);
        }
    };

    let on_stop = move |_| {
        if let Some(event) = session.try_update(|s| s.request_stop()).flatten() {
            emit(event);
        }
    };

    // フレームが変わるたびにオーバーレイを描き直す
    let redraw = move || {
        let (Some(img), Some(overlay)) = (img_ref.get_untracked(), canvas_ref.get_untracked()) else {
            return;
        };
        let width = img.client_width().max(0) as u32;
        let height = img.client_height().max(0) as u32;
        if canvas::reset(&overlay, width, height).is_none() {
            return;
        }
        session.with_untracked(|s| {
            let Some(metadata) = s.metadata() else {
                return;
            };
            let mask_alpha = s.params().map(|p| p.alpha).unwrap_or(0.5);
            if let Some(mask) = &metadata.mask {
                if let Err(e) = canvas::draw_mask(&overlay, mask, mask_alpha) {
                    gloo::console::warn!(format!("mask: {}", e));
                }
            }
            canvas::draw_stream_detections(&overlay, &metadata.detections);
        });
    };
    Effect::new(move |_| {
        session.with(|s| s.frames_received());
        redraw();
    });

    on_cleanup(move || {
        let _ = client.try_set_value(None);
    });

    let state = move || session.with(|s| s.state());
    let busy = Signal::derive(move || state() != SessionState::Connected);
    let error = Signal::derive(move || session.with(|s| s.error().map(str::to_string)));
    let frame_src = move || {
        session.with(|s| s.frame().map(|f| ensure_data_url(&f.image, "image/jpeg")))
    };

    view! {
        <section class="card">
            <h2>"リアルタイム解析"</h2>

            <div class="status-row">
                <span class=move || format!("status-badge {}", state().as_str())>
                    {move || match state() {
                        SessionState::Disconnected => "未接続",
                        SessionState::Connected => "待機中",
                        SessionState::Starting => "開始中...",
                        SessionState::Streaming => "配信中",
                    }}
                </span>
                <Show when=move || state() == SessionState::Disconnected>
                    <button class="btn btn-secondary btn-small" on:click=move |_| connect()>
                        "再接続"
                    </button>
                </Show>
            </div>

            <StreamControls kind=kind conf=conf alpha=alpha source=source disabled=busy />

            <div class="api-actions">
                <button
                    class="btn btn-primary"
                    prop:disabled=move || state() != SessionState::Connected
                    on:click=on_start
                >
                    "開始"
                </button>
                <button
                    class="btn btn-tertiary"
                    prop:disabled=move || !matches!(state(), SessionState::Starting | SessionState::Streaming)
                    on:click=on_stop
                >
                    "停止"
                </button>
            </div>

            <ErrorBanner message=error />

            <Show when=move || frame_src().is_some()>
                <div class="preview">
                    <img
                        node_ref=img_ref
                        src=move || frame_src().unwrap_or_default()
                        alt="配信フレーム"
                        on:load=move |_| redraw()
                    />
                    <canvas node_ref=canvas_ref class="overlay"></canvas>
                </div>
            </Show>

            <Show when=move || session.with(|s| s.is_streaming())>
                <div class="stats-row">
                    <div class="stat">
                        <span class="stat-label">"FPS"</span>
                        <span class="stat-value">{move || format!("{:.1}", session.with(|s| s.fps()))}</span>
                    </div>
                    <div class="stat">
                        <span class="stat-label">"受信フレーム"</span>
                        <span class="stat-value">{move || session.with(|s| s.frames_received())}</span>
                    </div>
                    <div class="stat">
                        <span class="stat-label">"検出数"</span>
                        <span class="stat-value">
                            {move || session.with(|s| s.metadata().map(|m| m.detections.len()).unwrap_or(0))}
                        </span>
                    </div>
                    {move || session.with(|s| s.info().cloned()).map(|info| view! {
                        <div class="stat">
                            <span class="stat-label">"入力"</span>
                            <span class="stat-value">
                                {format!("{}x{} @ {:.0}fps", info.width, info.height, info.fps)}
                            </span>
                        </div>
                    })}
                </div>
            </Show>
        </section>
    }
}
