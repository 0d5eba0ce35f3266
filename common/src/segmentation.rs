//! セグメンテーション結果の表示用フィルタ
//!
//! 「検出されたクラス」一覧に出すのは、背景以外で
//! 平均信頼度と面積率がどちらも閾値を超えるクラスのみ。
//! 表示専用で、元の統計データは変更しない。

use crate::types::{ClassStatistics, SegmentationResults};

pub const BACKGROUND_CLASS: &str = "background";
pub const MIN_AVG_CONFIDENCE: f64 = 0.9;
pub const MIN_PERCENTAGE: f64 = 0.01;

/// 一覧に表示するクラス
#[derive(Debug, Clone, PartialEq)]
pub struct SignificantClass<'a> {
    pub name: &'a str,
    pub stats: &'a ClassStatistics,
}

pub fn is_significant(name: &str, stats: &ClassStatistics) -> bool {
    !name.eq_ignore_ascii_case(BACKGROUND_CLASS)
        && stats.avg_confidence > MIN_AVG_CONFIDENCE
        && stats.percentage > MIN_PERCENTAGE
}

/// 面積率の降順で返す
pub fn significant_classes(results: &SegmentationResults) -> Vec<SignificantClass<'_>> {
    let mut classes: Vec<SignificantClass<'_>> = results
        .class_statistics
        .iter()
        .filter(|(name, stats)| is_significant(name, stats))
        .map(|(name, stats)| SignificantClass { name: name.as_str(), stats })
        .collect();
    classes.sort_by(|a, b| b.stats.percentage.total_cmp(&a.stats.percentage));
    classes
}
