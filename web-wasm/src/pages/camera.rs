//! カメラページ（ブラウザのカメラ映像を一定間隔で送り、結果を重ねる）
//!
//! 応答待ちの間に撮ったフレームは送らずに捨てる。

use super::{now_ms, open_socket};
use crate::api::socket::{SocketClient, SocketEvent};
use crate::canvas;
use crate::components::{error_banner::ErrorBanner, stream_controls::StreamControls};
use gloo::timers::callback::Interval;
use leptos::html::{Canvas, Video};
use leptos::prelude::*;
use smear_vision_common::events::ProcessFrame;
use smear_vision_common::fps::SHORT_WINDOW;
use smear_vision_common::overlay::CAPTURE_INTERVAL_MS;
use smear_vision_common::types::FrameMetadata;
use smear_vision_common::{ClientEvent, FpsCounter, FrameGate, ServerEvent, StreamKind};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{MediaStream, MediaStreamConstraints, MediaStreamTrack};

async fn open_camera() -> Result<MediaStream, String> {
    let devices = web_sys::window()
        .ok_or("window がありません")?
        .navigator()
        .media_devices()
        .map_err(|_| "このブラウザはカメラに対応していません".to_string())?;
    let constraints = MediaStreamConstraints::new();
    constraints.set_video(&JsValue::TRUE);
    constraints.set_audio(&JsValue::FALSE);
    let promise = devices
        .get_user_media_with_constraints(&constraints)
        .map_err(|e| format!("{:?}", e))?;
    let stream = JsFuture::from(promise)
        .await
        .map_err(|_| "カメラを使用できません（権限を確認してください）".to_string())?;
    stream
        .dyn_into::<MediaStream>()
        .map_err(|_| "カメラ映像を取得できません".to_string())
}

fn release_camera(stream: &MediaStream) {
    for track in stream.get_tracks().iter() {
        if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
            track.stop();
        }
    }
}

#[component]
pub fn CameraPage() -> impl IntoView {
    let connected = RwSignal::new(false);
    let capturing = RwSignal::new(false);
    let error = RwSignal::new(None::<String>);
    let metadata = RwSignal::new(None::<FrameMetadata>);
    let fps = RwSignal::new(FpsCounter::new(SHORT_WINDOW));
    let gate = RwSignal::new(FrameGate::new());

    let kind = RwSignal::new(StreamKind::Detect);
    let conf = RwSignal::new(0.25);
    let alpha = RwSignal::new(0.5);

    let client = StoredValue::new_local(None::<SocketClient>);
    let camera = StoredValue::new_local(None::<MediaStream>);
    let timer = StoredValue::new_local(None::<Interval>);

    let video_ref = NodeRef::<Video>::new();
    let canvas_ref = NodeRef::<Canvas>::new();

    // タイマーを止めてカメラを解放し、表示をリセットする
    let stop_capture = move || {
        let _ = timer.try_set_value(None);
        if let Some(stream) = camera.try_update_value(|c| c.take()).flatten() {
            release_camera(&stream);
        }
        if let Some(video) = video_ref.get_untracked() {
            video.set_src_object(None);
        }
        let _ = gate.try_update(|g| g.reset());
        let _ = fps.try_update(|f| f.reset());
        let _ = metadata.try_set(None);
        let _ = capturing.try_set(false);
    };

    let on_socket = move |event: SocketEvent| match event {
        SocketEvent::Connected => {
            connected.set(true);
            error.set(None);
        }
        SocketEvent::Disconnected(reason) => {
            connected.set(false);
            stop_capture();
            if reason.is_some() {
                error.set(reason);
            }
        }
        SocketEvent::Server(ServerEvent::DetectionResult(result)) => {
            // 別IDの遅れた応答でも表示は最新に置き換える
            gate.update(|g| {
                g.complete(result.frame_id);
            });
            if capturing.get_untracked() {
                fps.update(|f| {
                    f.record(now_ms());
                });
                metadata.set(Some(result.result));
            }
        }
        SocketEvent::Server(ServerEvent::StreamError(message) | ServerEvent::Error(message)) => {
            gate.update(|g| g.fail());
            error.set(Some(message));
        }
        SocketEvent::Server(_) => {}
    };

    let connect = move || {
        client.set_value(None);
        connected.set(false);
        match open_socket(on_socket) {
            Ok(socket) => client.set_value(Some(socket)),
            Err(e) => error.set(Some(e)),
        }
    };
    connect();

    // 1回分のキャプチャと送信
    let tick = move || {
        if !connected.get_untracked() {
            return;
        }
        let Some(frame_id) = gate.try_update(|g| g.try_begin(now_ms())).flatten() else {
            return;
        };
        let Some(video) = video_ref.get_untracked() else {
            gate.update(|g| g.fail());
            return;
        };
        let frame = match canvas::capture_jpeg(&video) {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                gate.update(|g| g.fail());
                return;
            }
            Err(e) => {
                gate.update(|g| g.fail());
                gloo::console::warn!(format!("capture: {}", e));
                return;
            }
        };
        let kind = kind.get_untracked();
        let event = ClientEvent::ProcessFrame(ProcessFrame {
            frame,
            kind,
            conf: conf.get_untracked(),
            return_mask: kind.wants_mask(),
            frame_id,
        });
        let sent = client.with_value(|c| match c {
            Some(socket) => socket.emit(&event),
            None => Err("サーバーに接続されていません".to_string()),
        });
        if let Err(e) = sent {
            gate.update(|g| g.fail());
            error.set(Some(e));
        }
    };

    let on_start = move |_| {
        if capturing.get_untracked() {
            return;
        }
        error.set(None);
        wasm_bindgen_futures::spawn_local(async move {
            let stream = match open_camera().await {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = error.try_set(Some(e));
                    return;
                }
            };
            let Some(video) = video_ref.try_get_untracked().flatten() else {
                // 待っている間にページを離れた
                release_camera(&stream);
                return;
            };
            video.set_src_object(Some(&stream));
            let _ = video.play();
            camera.set_value(Some(stream));
            timer.set_value(Some(Interval::new(CAPTURE_INTERVAL_MS, tick)));
            capturing.set(true);
        });
    };

    let redraw = move || {
        let (Some(video), Some(overlay)) = (video_ref.get_untracked(), canvas_ref.get_untracked()) else {
            return;
        };
        let width = video.client_width().max(0) as u32;
        let height = video.client_height().max(0) as u32;
        if canvas::reset(&overlay, width, height).is_none() {
            return;
        }
        metadata.with_untracked(|m| {
            let Some(m) = m else {
                return;
            };
            if let Some(mask) = &m.mask {
                if let Err(e) = canvas::draw_mask(&overlay, mask, alpha.get_untracked()) {
                    gloo::console::warn!(format!("mask: {}", e));
                }
            }
            canvas::draw_stream_detections(&overlay, &m.detections);
        });
    };
    Effect::new(move |_| {
        metadata.track();
        redraw();
    });

    on_cleanup(move || {
        stop_capture();
        let _ = client.try_set_value(None);
    });

    let busy = Signal::derive(move || capturing.get());

    view! {
        <section class="card">
            <h2>"カメラ解析"</h2>

            <div class="status-row">
                <span class=move || if connected.get() { "status-badge connected" } else { "status-badge disconnected" }>
                    {move || if connected.get() { "接続中" } else { "未接続" }}
                </span>
                <Show when=move || !connected.get()>
                    <button class="btn btn-secondary btn-small" on:click=move |_| connect()>
                        "再接続"
                    </button>
                </Show>
            </div>

            <StreamControls kind=kind conf=conf alpha=alpha disabled=busy />

            <div class="api-actions">
                <button
                    class="btn btn-primary"
                    prop:disabled=move || capturing.get() || !connected.get()
                    on:click=on_start
                >
                    "カメラ開始"
                </button>
                <button
                    class="btn btn-tertiary"
                    prop:disabled=move || !capturing.get()
                    on:click=move |_| stop_capture()
                >
                    "停止"
                </button>
            </div>

            <ErrorBanner message=error />

            <Show when=move || gate.with(|g| g.timed_out() > 0)>
                <p class="text-muted">
                    {move || gate.with(|g| format!("⚠ 応答のないフレームが {} 枚ありました", g.timed_out()))}
                </p>
            </Show>

            <div class="preview">
                <video node_ref=video_ref autoplay=true muted=true playsinline=true></video>
                <canvas node_ref=canvas_ref class="overlay"></canvas>
            </div>

            <Show when=move || capturing.get()>
                <div class="stats-row">
                    <div class="stat">
                        <span class="stat-label">"FPS"</span>
                        <span class="stat-value">{move || format!("{:.1}", fps.with(|f| f.fps()))}</span>
                    </div>
                    <div class="stat">
                        <span class="stat-label">"送信 / 破棄 / 無応答"</span>
                        <span class="stat-value">
                            {move || gate.with(|g| format!("{} / {} / {}", g.sent(), g.dropped(), g.timed_out()))}
                        </span>
                    </div>
                    <div class="stat">
                        <span class="stat-label">"検出数"</span>
                        <span class="stat-value">
                            {move || metadata.with(|m| m.as_ref().map(|m| m.detections.len()).unwrap_or(0))}
                        </span>
                    </div>
                </div>
            </Show>
        </section>
    }
}
