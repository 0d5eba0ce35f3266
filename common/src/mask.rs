//! セグメンテーションマスクの復号とRGBAラスタライズ
//!
//! バックエンドは画素ごとのクラスIDを次のどちらかで送ってくる:
//! - `raw`: 1画素1バイトを base64 化したもの
//! - `rle`: `[class_id, run_length]` の並び（行優先）

use crate::error::{Error, Result};
use crate::palette::{class_color, BACKGROUND_CLASS_ID};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// 受け付ける最大画素数（4096x4096）
pub const MAX_MASK_PIXELS: usize = 4096 * 4096;

/// 圧縮されたマスク
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "encoding", rename_all = "lowercase")]
pub enum EncodedMask {
    Raw { width: u32, height: u32, data: String },
    Rle { width: u32, height: u32, runs: Vec<[u32; 2]> },
}

/// 復号済みのクラスIDマップ
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMap {
    pub width: u32,
    pub height: u32,
    pub ids: Vec<u8>,
}

fn pixel_count(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .filter(|&n| n <= MAX_MASK_PIXELS)
        .ok_or_else(|| Error::Parse(format!("mask too large: {}x{}", width, height)))
}

impl EncodedMask {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            EncodedMask::Raw { width, height, .. } | EncodedMask::Rle { width, height, .. } => {
                (*width, *height)
            }
        }
    }

    pub fn decode(&self) -> Result<ClassMap> {
        let (width, height) = self.dimensions();
        let expected = pixel_count(width, height)?;

        let ids = match self {
            EncodedMask::Raw { data, .. } => STANDARD
                .decode(data.trim())
                .map_err(|e| Error::Parse(format!("mask base64: {}", e)))?,
            EncodedMask::Rle { runs, .. } => {
                // 確保はランの合計までに抑える
                let total = runs
                    .iter()
                    .fold(0usize, |acc, [_, run]| acc.saturating_add(*run as usize));
                let mut ids = Vec::with_capacity(total.min(expected));
                for [class_id, run] in runs {
                    let class_id = u8::try_from(*class_id)
                        .map_err(|_| Error::Parse(format!("class id out of range: {}", class_id)))?;
                    let run = *run as usize;
                    if ids.len() + run > expected {
                        return Err(Error::Parse(format!(
                            "mask runs exceed {}x{} pixels",
                            width, height
                        )));
                    }
                    ids.resize(ids.len() + run, class_id);
                }
                ids
            }
        };

        if ids.len() != expected {
            return Err(Error::Parse(format!(
                "mask has {} pixels, expected {}",
                ids.len(),
                expected
            )));
        }

        Ok(ClassMap { width, height, ids })
    }
}

impl ClassMap {
    /// RGBAバッファを生成（背景は透明、その他は `alpha` の不透明度）
    pub fn rasterize(&self, alpha: f64) -> Vec<u8> {
        let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        let mut rgba = Vec::with_capacity(self.ids.len() * 4);
        for &id in &self.ids {
            if id == BACKGROUND_CLASS_ID {
                rgba.extend_from_slice(&[0, 0, 0, 0]);
            } else {
                let [r, g, b] = class_color(id);
                rgba.extend_from_slice(&[r, g, b, a]);
            }
        }
        rgba
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::CLASS_COLORS;

    #[test]
    fn test_decode_rle() {
        let mask = EncodedMask::Rle {
            width: 3,
            height: 2,
            runs: vec![[0, 2], [1, 3], [2, 1]],
        };
        let map = mask.decode().unwrap();
        assert_eq!(map.ids, vec![0, 0, 1, 1, 1, 2]);
    }

    #[test]
    fn test_decode_raw() {
        let data = STANDARD.encode([0u8, 1, 1, 3]);
        let mask = EncodedMask::Raw { width: 2, height: 2, data };
        assert_eq!(mask.decode().unwrap().ids, vec![0, 1, 1, 3]);
    }

    #[test]
    fn test_decode_rejects_short_mask() {
        let mask = EncodedMask::Rle { width: 4, height: 4, runs: vec![[1, 3]] };
        assert!(matches!(mask.decode(), Err(Error::Parse(_))));
    }

    #[test]
    fn test_decode_rejects_overflowing_runs() {
        let mask = EncodedMask::Rle { width: 2, height: 1, runs: vec![[1, 5]] };
        assert!(mask.decode().is_err());
    }

    #[test]
    fn test_decode_rejects_large_class_id() {
        let mask = EncodedMask::Rle { width: 1, height: 1, runs: vec![[300, 1]] };
        assert!(mask.decode().is_err());
    }

    #[test]
    fn test_mask_json_shape() {
        let json = r#"{"encoding": "rle", "width": 2, "height": 1, "runs": [[1, 2]]}"#;
        let mask: EncodedMask = serde_json::from_str(json).unwrap();
        assert_eq!(mask.dimensions(), (2, 1));
    }

    #[test]
    fn test_rasterize_background_transparent() {
        let map = ClassMap { width: 2, height: 1, ids: vec![0, 1] };
        let rgba = map.rasterize(0.5);
        assert_eq!(&rgba[0..4], &[0, 0, 0, 0]);
        let [r, g, b] = CLASS_COLORS[1];
        assert_eq!(&rgba[4..8], &[r, g, b, 128]);
    }

    #[test]
    fn test_decode_rejects_oversized_header() {
        let mask = EncodedMask::Rle {
            width: u32::MAX,
            height: u32::MAX,
            runs: vec![[1, 1]],
        };
        assert!(matches!(mask.decode(), Err(Error::Parse(_))));

        let mask = EncodedMask::Rle { width: 5000, height: 5000, runs: vec![[1, 1]] };
        assert!(matches!(mask.decode(), Err(Error::Parse(_))));
    }

    #[test]
    fn test_decode_raw_rejects_oversized_header() {
        let mask = EncodedMask::Raw {
            width: u32::MAX,
            height: 2,
            data: STANDARD.encode([1u8]),
        };
        assert!(matches!(mask.decode(), Err(Error::Parse(_))));
    }
}
