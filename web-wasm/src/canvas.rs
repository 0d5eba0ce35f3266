//! オーバーレイ用キャンバスへの描画とカメラ映像のキャプチャ

use smear_vision_common::overlay::{
    box_label, capped_size, scale_normalized, scale_pixels, PixelRect, CAPTURE_JPEG_QUALITY,
    CAPTURE_MAX_WIDTH,
};
use smear_vision_common::palette::{label_color, to_css_hex};
use smear_vision_common::types::{Detection, StreamDetection};
use smear_vision_common::EncodedMask;
use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlVideoElement, ImageData};

const LABEL_HEIGHT: f64 = 16.0;

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
    canvas.get_context("2d").ok().flatten()?.dyn_into().ok()
}

fn create_canvas(width: u32, height: u32) -> Result<HtmlCanvasElement, String> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or("document がありません")?;
    let canvas: HtmlCanvasElement = document
        .create_element("canvas")
        .map_err(|e| format!("{:?}", e))?
        .dyn_into()
        .map_err(|_| "canvas を作成できません".to_string())?;
    canvas.set_width(width);
    canvas.set_height(height);
    Ok(canvas)
}

/// 表示サイズに合わせてキャンバスを揃え、前フレームの描画を消す
pub fn reset(canvas: &HtmlCanvasElement, width: u32, height: u32) -> Option<CanvasRenderingContext2d> {
    if canvas.width() != width {
        canvas.set_width(width);
    }
    if canvas.height() != height {
        canvas.set_height(height);
    }
    let ctx = context_2d(canvas)?;
    ctx.clear_rect(0.0, 0.0, f64::from(width), f64::from(height));
    Some(ctx)
}

fn stroke_box(ctx: &CanvasRenderingContext2d, rect: PixelRect, class_name: &str, confidence: f64) {
    let color = to_css_hex(label_color(class_name));
    let label = box_label(class_name, confidence);

    ctx.set_stroke_style_str(&color);
    ctx.set_line_width(2.0);
    ctx.stroke_rect(rect.x, rect.y, rect.width, rect.height);

    // 枠の上に収まらなければ枠の内側に置く
    let top = if rect.y >= LABEL_HEIGHT { rect.y - LABEL_HEIGHT } else { rect.y };
    ctx.set_font("12px sans-serif");
    let text_width = ctx
        .measure_text(&label)
        .map(|m| m.width())
        .unwrap_or(label.len() as f64 * 7.0);
    ctx.set_fill_style_str(&color);
    ctx.fill_rect(rect.x, top, text_width + 6.0, LABEL_HEIGHT);
    ctx.set_fill_style_str("#ffffff");
    let _ = ctx.fill_text(&label, rect.x + 3.0, top + 12.0);
}

/// ストリームの検出（正規化座標）
pub fn draw_stream_detections(canvas: &HtmlCanvasElement, detections: &[StreamDetection]) {
    let Some(ctx) = context_2d(canvas) else {
        return;
    };
    let (w, h) = (f64::from(canvas.width()), f64::from(canvas.height()));
    for det in detections {
        stroke_box(&ctx, scale_normalized(det.bbox, w, h), &det.class_name, det.confidence);
    }
}

/// `/api/detect` の検出（元画像の画素座標）
pub fn draw_detections(
    canvas: &HtmlCanvasElement,
    detections: &[Detection],
    source_width: u32,
    source_height: u32,
) {
    let Some(ctx) = context_2d(canvas) else {
        return;
    };
    let (w, h) = (f64::from(canvas.width()), f64::from(canvas.height()));
    for det in detections {
        let rect = scale_pixels(&det.bbox, source_width, source_height, w, h);
        stroke_box(&ctx, rect, &det.class_name, det.confidence);
    }
}

/// マスクをRGBA化してキャンバス全体に引き伸ばして重ねる
pub fn draw_mask(canvas: &HtmlCanvasElement, mask: &EncodedMask, alpha: f64) -> Result<(), String> {
    let class_map = mask.decode().map_err(|e| e.to_string())?;
    if class_map.width == 0 || class_map.height == 0 {
        return Ok(());
    }
    let rgba = class_map.rasterize(alpha);
    let image = ImageData::new_with_u8_clamped_array_and_sh(
        Clamped(rgba.as_slice()),
        class_map.width,
        class_map.height,
    )
    .map_err(|e| format!("{:?}", e))?;

    let layer = create_canvas(class_map.width, class_map.height)?;
    let layer_ctx = context_2d(&layer).ok_or("2d context がありません")?;
    layer_ctx
        .put_image_data(&image, 0.0, 0.0)
        .map_err(|e| format!("{:?}", e))?;

    let ctx = context_2d(canvas).ok_or("2d context がありません")?;
    // クラス境界をぼかさない
    ctx.set_image_smoothing_enabled(false);
    let drawn = ctx.draw_image_with_html_canvas_element_and_dw_and_dh(
        &layer,
        0.0,
        0.0,
        f64::from(canvas.width()),
        f64::from(canvas.height()),
    );
    ctx.set_image_smoothing_enabled(true);
    drawn.map_err(|e| format!("{:?}", e))
}

/// カメラ映像の現在フレームを幅640px以下のJPEG data URLにする
pub fn capture_jpeg(video: &HtmlVideoElement) -> Result<Option<String>, String> {
    let (width, height) = capped_size(video.video_width(), video.video_height(), CAPTURE_MAX_WIDTH);
    // メタデータ未取得
    if width == 0 || height == 0 {
        return Ok(None);
    }
    let canvas = create_canvas(width, height)?;
    let ctx = context_2d(&canvas).ok_or("2d context がありません")?;
    ctx.draw_image_with_html_video_element_and_dw_and_dh(
        video,
        0.0,
        0.0,
        f64::from(width),
        f64::from(height),
    )
    .map_err(|e| format!("{:?}", e))?;
    canvas
        .to_data_url_with_type_and_encoder_options("image/jpeg", &JsValue::from_f64(CAPTURE_JPEG_QUALITY))
        .map(Some)
        .map_err(|e| format!("{:?}", e))
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use smear_vision_common::palette::CLASS_COLORS;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn pixel(canvas: &HtmlCanvasElement, x: f64, y: f64) -> Vec<u8> {
        context_2d(canvas)
            .unwrap()
            .get_image_data(x, y, 1.0, 1.0)
            .unwrap()
            .data()
            .0
    }

    #[wasm_bindgen_test]
    fn test_mask_scaled_to_canvas() {
        let canvas = create_canvas(4, 2).unwrap();
        // 左半分が背景、右半分がクラス1
        let mask = EncodedMask::Rle {
            width: 2,
            height: 1,
            runs: vec![[0, 1], [1, 1]],
        };
        draw_mask(&canvas, &mask, 1.0).unwrap();

        assert_eq!(pixel(&canvas, 0.0, 0.0)[3], 0);
        let right = pixel(&canvas, 3.0, 1.0);
        assert_eq!(&right[..3], &CLASS_COLORS[1][..]);
        assert_eq!(right[3], 255);
    }

    #[wasm_bindgen_test]
    fn test_reset_resizes_and_clears() {
        let canvas = create_canvas(10, 10).unwrap();
        let ctx = context_2d(&canvas).unwrap();
        ctx.fill_rect(0.0, 0.0, 10.0, 10.0);

        reset(&canvas, 20, 5).unwrap();
        assert_eq!((canvas.width(), canvas.height()), (20, 5));
        assert_eq!(pixel(&canvas, 1.0, 1.0)[3], 0);
    }

    #[wasm_bindgen_test]
    fn test_bad_mask_reports_error() {
        let canvas = create_canvas(4, 4).unwrap();
        let mask = EncodedMask::Rle {
            width: 2,
            height: 2,
            runs: vec![[1, 1]],
        };
        assert!(draw_mask(&canvas, &mask, 0.5).is_err());
    }
}
