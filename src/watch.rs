//! MJPEG配信の受信

use crate::client::BackendClient;
use crate::error::Result;
use smear_vision_common::fps::{FpsCounter, LONG_WINDOW, THROTTLE_MS};
use smear_vision_common::StreamParams;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct WatchSummary {
    pub frames: u64,
    pub bytes: u64,
    pub discarded_bytes: u64,
    pub last_fps: f64,
    pub elapsed_secs: f64,
}

pub struct WatchOptions {
    pub max_frames: Option<u64>,
    pub out_dir: Option<PathBuf>,
}

/// 配信終了・指定枚数到達・Ctrl-C のいずれかまで受信する
pub async fn run_watch(
    client: &BackendClient,
    params: &StreamParams,
    options: WatchOptions,
    mut on_frame: impl FnMut(u64, f64),
) -> Result<WatchSummary> {
    if let Some(dir) = &options.out_dir {
        std::fs::create_dir_all(dir)?;
    }

    let mut stream = client.open_stream(params).await?;
    let mut fps = FpsCounter::new(LONG_WINDOW).with_throttle(THROTTLE_MS);
    let mut summary = WatchSummary::default();
    let started = Instant::now();

    loop {
        if options.max_frames.is_some_and(|max| summary.frames >= max) {
            break;
        }

        let next = tokio::select! {
            frame = stream.next_frame() => frame?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                None
            }
        };
        let Some(frame) = next else {
            break;
        };

        summary.frames += 1;
        summary.bytes += frame.len() as u64;
        summary.last_fps = fps.record(started.elapsed().as_secs_f64() * 1000.0);

        if let Some(dir) = &options.out_dir {
            let path = dir.join(format!("frame_{:06}.jpg", summary.frames));
            std::fs::write(&path, &frame)?;
        }
        on_frame(summary.frames, summary.last_fps);
    }

    summary.discarded_bytes = stream.discarded_bytes();
    if summary.discarded_bytes > 0 {
        tracing::warn!(bytes = summary.discarded_bytes, "discarded oversized mjpeg parts");
    }
    summary.elapsed_secs = started.elapsed().as_secs_f64();
    Ok(summary)
}
