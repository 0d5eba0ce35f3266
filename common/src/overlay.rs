//! オーバーレイ描画の座標計算とカメラキャプチャの寸法

use crate::types::BBox;

/// カメラ送信の間隔
pub const CAPTURE_INTERVAL_MS: u32 = 100;
/// 送信フレームの最大幅
pub const CAPTURE_MAX_WIDTH: u32 = 640;
/// 送信JPEGの品質
pub const CAPTURE_JPEG_QUALITY: f64 = 0.7;

/// キャンバス上の矩形（画素）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// 正規化座標 `[x1, y1, x2, y2]` をキャンバス画素に変換
pub fn scale_normalized(bbox: [f64; 4], canvas_width: f64, canvas_height: f64) -> PixelRect {
    let [x1, y1, x2, y2] = bbox.map(|v| v.clamp(0.0, 1.0));
    let (left, right) = (x1.min(x2), x1.max(x2));
    let (top, bottom) = (y1.min(y2), y1.max(y2));
    PixelRect {
        x: left * canvas_width,
        y: top * canvas_height,
        width: (right - left) * canvas_width,
        height: (bottom - top) * canvas_height,
    }
}

/// 元画像の画素座標を表示サイズへ変換
pub fn scale_pixels(
    bbox: &BBox,
    source_width: u32,
    source_height: u32,
    display_width: f64,
    display_height: f64,
) -> PixelRect {
    let sx = display_width / f64::from(source_width.max(1));
    let sy = display_height / f64::from(source_height.max(1));
    PixelRect {
        x: bbox.x1 * sx,
        y: bbox.y1 * sy,
        width: bbox.width() * sx,
        height: bbox.height() * sy,
    }
}

/// 幅を `max_width` 以下に抑えた縦横比維持のサイズ
pub fn capped_size(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width == 0 || height == 0 || width <= max_width {
        return (width, height);
    }
    let scaled_height = (f64::from(height) * f64::from(max_width) / f64::from(width)).round() as u32;
    (max_width, scaled_height.max(1))
}

/// "RBC 91%"
pub fn box_label(class_name: &str, confidence: f64) -> String {
    format!("{} {:.0}%", class_name, confidence * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_normalized() {
        let rect = scale_normalized([0.25, 0.5, 0.75, 1.0], 400.0, 200.0);
        assert_eq!(rect, PixelRect { x: 100.0, y: 100.0, width: 200.0, height: 100.0 });
    }

    #[test]
    fn test_scale_normalized_clamps_and_orders() {
        let rect = scale_normalized([1.2, 0.5, 0.5, -0.1], 100.0, 100.0);
        assert_eq!(rect, PixelRect { x: 50.0, y: 0.0, width: 50.0, height: 50.0 });
    }

    #[test]
    fn test_scale_pixels() {
        let bbox = BBox { x1: 100.0, y1: 50.0, x2: 300.0, y2: 150.0 };
        let rect = scale_pixels(&bbox, 800, 400, 400.0, 200.0);
        assert_eq!(rect, PixelRect { x: 50.0, y: 25.0, width: 100.0, height: 50.0 });
    }

    #[test]
    fn test_capped_size() {
        assert_eq!(capped_size(1280, 720, CAPTURE_MAX_WIDTH), (640, 360));
        assert_eq!(capped_size(320, 240, CAPTURE_MAX_WIDTH), (320, 240));
        assert_eq!(capped_size(0, 0, CAPTURE_MAX_WIDTH), (0, 0));
    }

    #[test]
    fn test_box_label() {
        assert_eq!(box_label("WBC", 0.914), "WBC 91%");
    }
}
