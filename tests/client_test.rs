//! スタブバックエンドを使ったHTTPクライアントの結合テスト

mod common;

use common::{stub_backend, write_png};
use smear_vision::client::BackendClient;
use smear_vision::error::SmearError;
use smear_vision::watch::{run_watch, WatchOptions};
use smear_vision_common::session::StreamSource;
use smear_vision_common::{StreamKind, StreamParams};
use tempfile::tempdir;

const DETECT_OK: &str = r#"{
    "success": true,
    "timestamp": "2025-03-01T10:00:00",
    "image_info": {"width": 8, "height": 8, "filename": "smear.png"},
    "detection_stats": {"total_count": 3, "average_confidence": 0.8, "confidence_threshold": 0.4},
    "detections": [
        {"id": 0, "class": "RBC", "confidence": 0.91, "bbox": {"x1": 0, "y1": 0, "x2": 2, "y2": 2}},
        {"id": 1, "class": "RBC", "confidence": 0.84, "bbox": {"x1": 3, "y1": 3, "x2": 5, "y2": 5}},
        {"id": 2, "class": "WBC", "confidence": 0.65, "bbox": {"x1": 4, "y1": 1, "x2": 7, "y2": 6}}
    ],
    "annotated_image": "data:image/jpeg;base64,AAAA"
}"#;

const CATEGORIZE_OK: &str = r#"{
    "success": true,
    "timestamp": 1740823200.5,
    "class_legend": {"RBC": "red", "WBC": "blue"},
    "overlay_image": "data:image/png;base64,AAAA",
    "segmentation_results": {
        "class_statistics": {
            "background": {"class_id": 0, "avg_confidence": 0.99, "percentage": 70.0, "pixel_count": 45},
            "RBC": {"class_id": 1, "avg_confidence": 0.95, "percentage": 25.0, "pixel_count": 16},
            "WBC": {"class_id": 2, "avg_confidence": 0.5, "percentage": 5.0, "pixel_count": 3}
        },
        "dominant_class": "RBC",
        "dominant_confidence": 0.95,
        "dominant_percentage": 25.0,
        "overall_confidence": 0.9
    }
}"#;

fn client(base: &str) -> BackendClient {
    BackendClient::with_base(base, 5, 1920).unwrap()
}

#[tokio::test]
async fn test_detect_success() {
    let dir = tempdir().unwrap();
    let image = write_png(dir.path(), "smear.png");
    let (base, request) = stub_backend("200 OK", "application/json", DETECT_OK.into()).await;

    let resp = client(&base).detect(&image, 0.4).await.unwrap();
    assert_eq!(resp.detection_stats.total_count, 3);
    assert_eq!(resp.detections.len(), 3);
    assert_eq!(resp.detections[2].class_name, "WBC");

    let request = String::from_utf8_lossy(&request.await.unwrap()).to_string();
    assert!(request.starts_with("POST /api/detect "));
    assert!(request.contains("name=\"image\"; filename=\"smear.png\""));
    assert!(request.contains("name=\"confidence\""));
    assert!(request.contains("0.4"));
}

#[tokio::test]
async fn test_detect_success_false_is_backend_error() {
    let dir = tempdir().unwrap();
    let image = write_png(dir.path(), "smear.png");
    let body = r#"{"success": false, "error": "model not loaded"}"#;
    let (base, _request) = stub_backend("200 OK", "application/json", body.into()).await;

    let err = client(&base).detect(&image, 0.25).await.unwrap_err();
    assert!(matches!(err, SmearError::Backend(ref m) if m == "model not loaded"));
}

/// JSONでない5xxはステータスを伝える
#[tokio::test]
async fn test_detect_http_error_without_json() {
    let dir = tempdir().unwrap();
    let image = write_png(dir.path(), "smear.png");
    let (base, _request) =
        stub_backend("500 Internal Server Error", "text/html", b"<h1>oops</h1>".to_vec()).await;

    let err = client(&base).detect(&image, 0.25).await.unwrap_err();
    assert!(matches!(err, SmearError::Backend(ref m) if m.contains("500")));
}

#[tokio::test]
async fn test_categorize_success() {
    let dir = tempdir().unwrap();
    let image = write_png(dir.path(), "smear.png");
    let (base, request) =
        stub_backend("200 OK", "application/json", CATEGORIZE_OK.into()).await;

    let resp = client(&base).categorize(&image).await.unwrap();
    assert_eq!(resp.segmentation_results.dominant_class, "RBC");
    assert_eq!(resp.segmentation_results.class_statistics.len(), 3);

    let lines = smear_vision::report::categorize_lines(&resp);
    // 見出し + RBC のみ（背景と低信頼度のWBCは除外）
    assert_eq!(lines.len(), 2);
    assert!(lines[1].contains("RBC"));
    assert!(lines[1].contains("red"));

    let request = String::from_utf8_lossy(&request.await.unwrap()).to_string();
    assert!(request.starts_with("POST /api/categorize "));
    assert!(!request.contains("name=\"confidence\""));
}

#[tokio::test]
async fn test_detect_missing_file_sends_nothing() {
    let client = client("http://127.0.0.1:9");
    let err = client
        .detect(std::path::Path::new("/no/such/smear.png"), 0.25)
        .await
        .unwrap_err();
    assert!(matches!(err, SmearError::FileNotFound(_)));
}

fn mjpeg_body(frames: &[&[u8]]) -> Vec<u8> {
    let mut body = Vec::new();
    for frame in frames {
        body.extend_from_slice(b"--frame\r\nContent-Type: image/jpeg\r\n\r\n");
        body.extend_from_slice(frame);
        body.extend_from_slice(b"\r\n");
    }
    body
}

#[tokio::test]
async fn test_watch_reads_frames_until_end() {
    let frames: [&[u8]; 3] = [
        &[0xFF, 0xD8, 1, 0xFF, 0xD9],
        &[0xFF, 0xD8, 2, 2, 0xFF, 0xD9],
        &[0xFF, 0xD8, 3, 3, 3, 0xFF, 0xD9],
    ];
    let (base, request) = stub_backend(
        "200 OK",
        "multipart/x-mixed-replace; boundary=frame",
        mjpeg_body(&frames),
    )
    .await;

    let out = tempdir().unwrap();
    let params = StreamParams {
        kind: StreamKind::Segment,
        source: StreamSource::Camera(1),
        conf: 0.3,
        alpha: 0.6,
    };
    let mut seen = Vec::new();
    let summary = run_watch(
        &client(&base),
        &params,
        WatchOptions {
            max_frames: None,
            out_dir: Some(out.path().to_path_buf()),
        },
        |n, _fps| seen.push(n),
    )
    .await
    .unwrap();

    assert_eq!(summary.frames, 3);
    assert_eq!(summary.bytes, 5 + 6 + 7);
    assert_eq!(seen, vec![1, 2, 3]);
    assert_eq!(
        std::fs::read(out.path().join("frame_000002.jpg")).unwrap(),
        frames[1]
    );

    let request = String::from_utf8_lossy(&request.await.unwrap()).to_string();
    assert!(request.starts_with("GET /api/stream/segment?source=1&conf=0.3&alpha=0.6 "));
}

#[tokio::test]
async fn test_watch_stops_at_max_frames() {
    let frames: [&[u8]; 2] = [&[0xFF, 0xD8, 9, 0xFF, 0xD9], &[0xFF, 0xD8, 8, 0xFF, 0xD9]];
    let (base, _request) = stub_backend(
        "200 OK",
        "multipart/x-mixed-replace; boundary=frame",
        mjpeg_body(&frames),
    )
    .await;

    let summary = run_watch(
        &client(&base),
        &StreamParams::default(),
        WatchOptions {
            max_frames: Some(1),
            out_dir: None,
        },
        |_, _| {},
    )
    .await
    .unwrap();
    assert_eq!(summary.frames, 1);
}

#[tokio::test]
async fn test_stream_rejects_non_multipart() {
    let (base, _request) = stub_backend("200 OK", "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xD9]).await;
    let result = client(&base).open_stream(&StreamParams::default()).await;
    assert!(matches!(result, Err(SmearError::Stream(_))));
}

#[tokio::test]
async fn test_watch_keeps_frame_with_embedded_thumbnail() {
    // APP1 内にサムネイル（FFD8..FFD9）を持つフレーム
    let frame: &[u8] = &[
        0xFF, 0xD8, 0xFF, 0xE1, 0xFF, 0xD8, 0x07, 0x07, 0xFF, 0xD9, 0x42, 0x42, 0xFF, 0xD9,
    ];
    let mut body = mjpeg_body(&[frame]);
    body.extend_from_slice(b"--frame--\r\n");
    let (base, _request) = stub_backend(
        "200 OK",
        "multipart/x-mixed-replace; boundary=frame",
        body,
    )
    .await;

    let out = tempdir().unwrap();
    let summary = run_watch(
        &client(&base),
        &StreamParams::default(),
        WatchOptions {
            max_frames: None,
            out_dir: Some(out.path().to_path_buf()),
        },
        |_, _| {},
    )
    .await
    .unwrap();

    assert_eq!(summary.frames, 1);
    assert_eq!(summary.discarded_bytes, 0);
    assert_eq!(
        std::fs::read(out.path().join("frame_000001.jpg")).unwrap(),
        frame
    );
}
