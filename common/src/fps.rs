//! フレーム到着レートの表示用カウンタ
//!
//! 直近N件の到着時刻（ミリ秒）からFPSを概算する。制御には使わない。

use std::collections::VecDeque;

/// カメラ送信方式のページで使う窓幅
pub const SHORT_WINDOW: usize = 10;
/// サーバー配信方式のページで使う窓幅
pub const LONG_WINDOW: usize = 30;
/// 再計算の最小間隔
pub const THROTTLE_MS: f64 = 500.0;

#[derive(Debug, Clone)]
pub struct FpsCounter {
    capacity: usize,
    arrivals: VecDeque<f64>,
    throttle_ms: Option<f64>,
    last_computed_at: Option<f64>,
    current: f64,
}

impl FpsCounter {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            capacity,
            arrivals: VecDeque::with_capacity(capacity),
            throttle_ms: None,
            last_computed_at: None,
            current: 0.0,
        }
    }

    /// 再計算を `throttle_ms` ごとに間引く
    pub fn with_throttle(mut self, throttle_ms: f64) -> Self {
        self.throttle_ms = Some(throttle_ms);
        self
    }

    /// 到着を記録し、表示用FPSを返す
    pub fn record(&mut self, now_ms: f64) -> f64 {
        if self.arrivals.len() == self.capacity {
            self.arrivals.pop_front();
        }
        self.arrivals.push_back(now_ms);

        let due = match (self.throttle_ms, self.last_computed_at) {
            (Some(throttle), Some(last)) => now_ms - last >= throttle,
            _ => true,
        };
        if due {
            self.current = self.compute();
            self.last_computed_at = Some(now_ms);
        }
        self.current
    }

    fn compute(&self) -> f64 {
        let (Some(first), Some(last)) = (self.arrivals.front(), self.arrivals.back()) else {
            return 0.0;
        };
        let span = last - first;
        if self.arrivals.len() < 2 || span <= 0.0 {
            return 0.0;
        }
        (self.arrivals.len() - 1) as f64 * 1000.0 / span
    }

    pub fn fps(&self) -> f64 {
        self.current
    }

    pub fn frames_in_window(&self) -> usize {
        self.arrivals.len()
    }

    pub fn reset(&mut self) {
        self.arrivals.clear();
        self.last_computed_at = None;
        self.current = 0.0;
    }
}
