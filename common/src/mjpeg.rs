//! MJPEG (`multipart/x-mixed-replace`) の本文からJPEGを切り出す
//!
//! パートは境界文字列で区切る。`Content-Length` があればその長さで、
//! なければ次の境界の直前までを1フレームとする。
//! 次の境界より先にJPEGのマーカー構造上の EOI が揃えば、その時点で切り出す
//! （APPセグメント内のサムネイルは長さで読み飛ばす）。

const MAX_FRAME_BYTES: usize = 8 * 1024 * 1024;
const HEADER_END: &[u8] = b"\r\n\r\n";

#[derive(Debug)]
pub struct MjpegSplitter {
    delimiter: Vec<u8>,
    buffer: Vec<u8>,
    discarded_bytes: u64,
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

enum JpegEnd {
    Complete(usize),
    Incomplete,
    Invalid,
}

/// SOIから辿って本体の EOI の直後の位置を求める
fn jpeg_end(data: &[u8]) -> JpegEnd {
    if data.len() < 2 {
        return JpegEnd::Incomplete;
    }
    if data[..2] != [0xFF, 0xD8] {
        return JpegEnd::Invalid;
    }
    let mut i = 2;
    loop {
        if i + 1 >= data.len() {
            return JpegEnd::Incomplete;
        }
        if data[i] != 0xFF {
            return JpegEnd::Invalid;
        }
        let marker = data[i + 1];
        match marker {
            0xFF => i += 1,
            0xD9 => return JpegEnd::Complete(i + 2),
            0x01 | 0xD0..=0xD7 => i += 2,
            _ => {
                if i + 4 > data.len() {
                    return JpegEnd::Incomplete;
                }
                let seg_len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
                if seg_len < 2 {
                    return JpegEnd::Invalid;
                }
                i += 2 + seg_len;
                if marker == 0xDA {
                    // エントロピー符号化データ（FF00 とRSTは読み飛ばす）
                    loop {
                        if i + 1 >= data.len() {
                            return JpegEnd::Incomplete;
                        }
                        if data[i] == 0xFF && !matches!(data[i + 1], 0x00 | 0xD0..=0xD7) {
                            break;
                        }
                        i += if data[i] == 0xFF { 2 } else { 1 };
                    }
                }
            }
        }
    }
}

fn content_length(headers: &[u8]) -> Option<usize> {
    String::from_utf8_lossy(headers).lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        if key.trim().eq_ignore_ascii_case("content-length") {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

impl MjpegSplitter {
    /// `boundary` は Content-Type の値（先頭の `--` は含まない）
    pub fn new(boundary: &str) -> Self {
        Self {
            delimiter: format!("--{}", boundary).into_bytes(),
            buffer: Vec::with_capacity(64 * 1024),
            discarded_bytes: 0,
        }
    }

    /// 受信チャンクを追加し、完成したフレームを返す
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(frame) = self.next_part() {
            if !frame.is_empty() {
                frames.push(frame);
            }
        }

        if self.buffer.len() > MAX_FRAME_BYTES {
            // 区切りが来ないまま肥大化したら境界1つ分だけ残す
            let keep = self.delimiter.len();
            let drain_len = self.buffer.len() - keep;
            self.buffer.drain(..drain_len);
            self.discarded_bytes += drain_len as u64;
        }
        frames
    }

    /// 上限超過で捨てたバイト数
    pub fn discarded_bytes(&self) -> u64 {
        self.discarded_bytes
    }

    /// 配信終了時、最後の境界以降に残ったパートを取り出す
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        let buffer = std::mem::take(&mut self.buffer);
        if !buffer.starts_with(&self.delimiter) {
            return None;
        }
        let header_end = find(&buffer, HEADER_END, self.delimiter.len())?;
        let mut body = &buffer[header_end + HEADER_END.len()..];
        if let Some(len) = content_length(&buffer[..header_end]) {
            body = &body[..len.min(body.len())];
        }
        let body = body.strip_suffix(b"\r\n").unwrap_or(body);
        (!body.is_empty()).then(|| body.to_vec())
    }

    fn next_part(&mut self) -> Option<Vec<u8>> {
        let start = find(&self.buffer, &self.delimiter, 0)?;
        if start > 0 {
            // 前置きや前パートの残り
            self.buffer.drain(..start);
        }

        let header_end = find(&self.buffer, HEADER_END, self.delimiter.len())?;
        let body_start = header_end + HEADER_END.len();

        let (body_end, consumed) = match content_length(&self.buffer[..header_end]) {
            Some(len) => {
                let end = body_start.checked_add(len)?;
                if self.buffer.len() < end {
                    return None;
                }
                (end, end)
            }
            None => match find(&self.buffer, &self.delimiter, body_start) {
                Some(next) => {
                    let end = if self.buffer[..next].ends_with(b"\r\n") {
                        next - 2
                    } else {
                        next
                    };
                    (end.max(body_start), next)
                }
                None => match jpeg_end(&self.buffer[body_start..]) {
                    JpegEnd::Complete(len) => (body_start + len, body_start + len),
                    JpegEnd::Incomplete | JpegEnd::Invalid => return None,
                },
            },
        };

        let frame = self.buffer[body_start..body_end].to_vec();
        self.buffer.drain(..consumed);
        Some(frame)
    }
}

/// Content-Type から multipart の境界文字列を取り出す
pub fn boundary_from_content_type(content_type: &str) -> Option<String> {
    if !content_type.to_lowercase().starts_with("multipart/") {
        return None;
    }
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("boundary") {
            Some(value.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg(payload: u8) -> Vec<u8> {
        vec![0xFF, 0xD8, payload, payload, 0xFF, 0xD9]
    }

    fn part(frame: &[u8]) -> Vec<u8> {
        let mut out = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n".to_vec();
        out.extend_from_slice(frame);
        out.extend_from_slice(b"\r\n");
        out
    }

    #[test]
    fn test_splits_two_frames_in_one_chunk() {
        let mut body = part(&jpeg(1));
        body.extend(part(&jpeg(2)));
        body.extend_from_slice(b"--frame\r\n");
        let mut splitter = MjpegSplitter::new("frame");
        let frames = splitter.push(&body);
        assert_eq!(frames, vec![jpeg(1), jpeg(2)]);
    }

    #[test]
    fn test_frame_waits_for_next_boundary() {
        let mut splitter = MjpegSplitter::new("frame");
        assert!(splitter.push(&part(&jpeg(7))).is_empty());
        assert_eq!(splitter.push(b"--frame\r\n"), vec![jpeg(7)]);
    }

    #[test]
    fn test_embedded_thumbnail_not_truncated() {
        // EXIFサムネイルを含むJPEG（途中に FFD8..FFD9 がある）
        let mut frame = vec![0xFF, 0xD8, 0xFF, 0xE1];
        frame.extend(jpeg(9));
        frame.extend_from_slice(&[0x42, 0x42, 0xFF, 0xD9]);

        let mut body = part(&frame);
        body.extend_from_slice(b"--frame\r\n");
        let mut splitter = MjpegSplitter::new("frame");
        assert_eq!(splitter.push(&body), vec![frame]);
    }

    /// APP1にサムネイルを持つ最小構成のJPEG
    fn structured_jpeg() -> Vec<u8> {
        vec![
            0xFF, 0xD8, // SOI
            0xFF, 0xE1, 0x00, 0x08, 0xFF, 0xD8, 0xAA, 0xBB, 0xFF, 0xD9, // APP1
            0xFF, 0xDA, 0x00, 0x04, 0x01, 0x02, // SOS
            0x11, 0xFF, 0x00, 0x22, // 符号化データ
            0xFF, 0xD9, // EOI
        ]
    }

    #[test]
    fn test_structured_frame_emitted_before_next_boundary() {
        let frame = structured_jpeg();
        let mut splitter = MjpegSplitter::new("frame");
        assert_eq!(splitter.push(&part(&frame)), vec![frame.clone()]);

        // 残りの CRLF は次のパートの前置きとして捨てられる
        let mut next = part(&frame);
        next.extend_from_slice(b"--frame\r\n");
        assert_eq!(splitter.push(&next), vec![frame]);
    }

    #[test]
    fn test_structured_frame_waits_until_complete() {
        let frame = structured_jpeg();
        let body = part(&frame);
        let (a, b) = body.split_at(body.len() - 4);
        let mut splitter = MjpegSplitter::new("frame");
        assert!(splitter.push(a).is_empty());
        assert_eq!(splitter.push(b), vec![frame]);
    }

    #[test]
    fn test_finish_returns_trailing_part() {
        let mut splitter = MjpegSplitter::new("frame");
        assert!(splitter.push(&part(&jpeg(5))).is_empty());
        assert_eq!(splitter.finish(), Some(jpeg(5)));
        assert_eq!(splitter.finish(), None);
    }

    #[test]
    fn test_content_length_split_across_chunks() {
        let frame = jpeg(3);
        let mut body = b"preamble\r\n--frame\r\nContent-Type: image/jpeg\r\nContent-Length: 6\r\n\r\n".to_vec();
        body.extend_from_slice(&frame);
        let (a, b) = body.split_at(body.len() - 3);

        let mut splitter = MjpegSplitter::new("frame");
        assert!(splitter.push(a).is_empty());
        assert_eq!(splitter.push(b), vec![frame]);
    }

    #[test]
    fn test_oversized_part_is_discarded() {
        let mut splitter = MjpegSplitter::new("frame");
        let mut body = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n".to_vec();
        body.resize(MAX_FRAME_BYTES + 100, 0x11);
        assert!(splitter.push(&body).is_empty());
        assert!(splitter.discarded_bytes() > 0);

        // 次の境界からは通常どおり切り出せる
        let mut next = part(&jpeg(4));
        next.extend_from_slice(b"--frame\r\n");
        assert_eq!(splitter.push(&next), vec![jpeg(4)]);
    }

    #[test]
    fn test_boundary_parse() {
        assert_eq!(
            boundary_from_content_type("multipart/x-mixed-replace; boundary=frame"),
            Some("frame".to_string())
        );
        assert_eq!(
            boundary_from_content_type(r#"multipart/x-mixed-replace;boundary="--xyz""#),
            Some("--xyz".to_string())
        );
        assert_eq!(boundary_from_content_type("image/jpeg"), None);
    }
}
