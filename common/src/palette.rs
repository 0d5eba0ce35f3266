//! クラスID → 表示色の固定テーブル

/// クラス0は背景（透明）
pub const BACKGROUND_CLASS_ID: u8 = 0;

/// RGB。インデックスがクラスID
pub const CLASS_COLORS: &[[u8; 3]] = &[
    [0, 0, 0],       // background
    [220, 38, 38],   // red blood cell
    [37, 99, 235],   // white blood cell
    [234, 179, 8],   // platelet
    [22, 163, 74],
    [147, 51, 234],
    [8, 145, 178],
    [234, 88, 12],
    [219, 39, 119],
    [100, 116, 139],
];

/// クラスIDの表示色（テーブル外は循環させる）
pub fn class_color(class_id: u8) -> [u8; 3] {
    let idx = class_id as usize;
    if idx < CLASS_COLORS.len() {
        CLASS_COLORS[idx]
    } else {
        // 背景色を避けて循環
        CLASS_COLORS[1 + (idx - 1) % (CLASS_COLORS.len() - 1)]
    }
}

/// 検出ラベルの表示色。血球3種は固定、それ以外は名前から決める
pub fn label_color(class_name: &str) -> [u8; 3] {
    let id = match class_name.trim().to_lowercase().as_str() {
        "rbc" => 1,
        "wbc" => 2,
        "platelets" | "platelet" => 3,
        other => {
            let sum = other.bytes().fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
            4 + (sum % (CLASS_COLORS.len() as u32 - 4)) as u8
        }
    };
    class_color(id)
}

/// 凡例の色名 → RGB
pub fn named_color(name: &str) -> Option<[u8; 3]> {
    let rgb = match name.trim().to_lowercase().as_str() {
        "red" => [220, 38, 38],
        "blue" => [37, 99, 235],
        "yellow" => [234, 179, 8],
        "green" => [22, 163, 74],
        "purple" => [147, 51, 234],
        "cyan" => [8, 145, 178],
        "orange" => [234, 88, 12],
        "pink" | "magenta" => [219, 39, 119],
        "gray" | "grey" => [100, 116, 139],
        "black" => [0, 0, 0],
        "white" => [255, 255, 255],
        _ => return None,
    };
    Some(rgb)
}

/// CSS用 "#rrggbb"
pub fn to_css_hex(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_color_stable() {
        assert_eq!(label_color("RBC"), CLASS_COLORS[1]);
        assert_eq!(label_color("wbc"), CLASS_COLORS[2]);
        assert_eq!(label_color("Platelets"), CLASS_COLORS[3]);
        let other = label_color("Neutrophil");
        assert_eq!(other, label_color("neutrophil"));
        assert!(CLASS_COLORS[4..].contains(&other));
    }

    #[test]
    fn test_class_color_wraps_past_table() {
        let n = CLASS_COLORS.len() as u8;
        assert_eq!(class_color(1), CLASS_COLORS[1]);
        assert_eq!(class_color(n), CLASS_COLORS[1]);
        assert_ne!(class_color(200), CLASS_COLORS[0]);
    }

    #[test]
    fn test_named_color() {
        assert_eq!(named_color("Red"), Some([220, 38, 38]));
        assert_eq!(named_color("grey"), named_color("gray"));
        assert_eq!(named_color("chartreuse"), None);
    }

    #[test]
    fn test_to_css_hex() {
        assert_eq!(to_css_hex([255, 0, 16]), "#ff0010");
    }
}
