//! 送信中フレームを1枚に制限するゲート
//!
//! 応答待ちの間にキャプチャされたフレームは捨てる（キューしない）。
//! 応答が `RESPONSE_TIMEOUT_MS` 以上返らなければ、そのフレームは諦めて次を送る。

/// 1フレームの応答を待つ上限
pub const RESPONSE_TIMEOUT_MS: f64 = 3000.0;

#[derive(Debug, Clone, Default)]
pub struct FrameGate {
    /// 送信中のフレームIDと送信時刻（ミリ秒）
    in_flight: Option<(u64, f64)>,
    next_id: u64,
    sent: u64,
    dropped: u64,
    timed_out: u64,
}

impl FrameGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// 送信可能ならフレームIDを払い出す。応答待ちなら `None`（破棄扱い）。
    /// 待ち時間が上限を超えていれば無応答として扱い、新しいIDを払い出す
    pub fn try_begin(&mut self, now_ms: f64) -> Option<u64> {
        if let Some((_, started)) = self.in_flight {
            if now_ms - started < RESPONSE_TIMEOUT_MS {
                self.dropped += 1;
                return None;
            }
            self.timed_out += 1;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.sent += 1;
        self.in_flight = Some((id, now_ms));
        Some(id)
    }

    /// 応答受信。別IDの遅延応答でもゲートは開ける
    pub fn complete(&mut self, frame_id: u64) -> bool {
        let matched = self.in_flight.is_some_and(|(id, _)| id == frame_id);
        self.in_flight = None;
        matched
    }

    /// 送信失敗・エラー応答
    pub fn fail(&mut self) {
        self.in_flight = None;
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// 応答が返らず諦めたフレーム数
    pub fn timed_out(&self) -> u64 {
        self.timed_out
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
