//! Frame extraction from a raw byte stream.
//!
//! Streaming responses arrive as arbitrary byte chunks; protocol frames
//! are newline-delimited. `FrameReader` buffers across chunk boundaries
//! so a frame split over two reads is delivered exactly once, whole.
//! It knows nothing about the `data:` envelope or the JSON payload;
//! that is the interpreter's job.

/// Accumulates bytes and yields complete newline-delimited frames.
#[derive(Debug, Default)]
pub struct FrameReader {
    buffer: Vec<u8>,
}

impl FrameReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and drain every frame completed by it.
    ///
    /// A frame is complete only once its trailing newline has been seen;
    /// the delimiter (and a preceding carriage return) is stripped. Blank
    /// lines are event separators, not frames, and are not emitted.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(newline_pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            let line = String::from_utf8_lossy(&line[..newline_pos]);
            let line = line.trim_end_matches('\r');
            if !line.is_empty() {
                frames.push(line.to_string());
            }
        }
        frames
    }

    /// Flush any residue at end-of-stream as one final frame attempt.
    ///
    /// Upstreams usually terminate every frame, but a connection that
    /// closes mid-line must not silently drop the tail.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let residue = std::mem::take(&mut self.buffer);
        let line = String::from_utf8_lossy(&residue);
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            None
        } else {
            Some(line.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deliver `bytes` split at every possible single position and
    /// compare against the all-at-once framing.
    fn assert_chunk_boundary_invariant(bytes: &[u8]) {
        let mut whole = FrameReader::new();
        let mut expected = whole.feed(bytes);
        if let Some(tail) = whole.finish() {
            expected.push(tail);
        }

        for split in 0..=bytes.len() {
            let mut reader = FrameReader::new();
            let mut got = reader.feed(&bytes[..split]);
            got.extend(reader.feed(&bytes[split..]));
            if let Some(tail) = reader.finish() {
                got.push(tail);
            }
            assert_eq!(got, expected, "split at byte {}", split);
        }
    }

    #[test]
    fn test_frames_are_chunk_boundary_invariant() {
        assert_chunk_boundary_invariant(
            b"data: {\"a\":1}\n\ndata: {\"b\":2}\n\ndata: [DONE]\n\n",
        );
    }

    #[test]
    fn test_invariant_holds_across_multibyte_utf8() {
        assert_chunk_boundary_invariant("data: {\"text\":\"héllo ✓\"}\n\n".as_bytes());
    }

    #[test]
    fn test_partial_frame_is_held_back() {
        let mut reader = FrameReader::new();
        assert!(reader.feed(b"data: {\"par").is_empty());
        let frames = reader.feed(b"tial\":true}\n");
        assert_eq!(frames, vec!["data: {\"partial\":true}"]);
    }

    #[test]
    fn test_crlf_delimiters_are_stripped() {
        let mut reader = FrameReader::new();
        let frames = reader.feed(b"data: one\r\ndata: two\r\n");
        assert_eq!(frames, vec!["data: one", "data: two"]);
    }

    #[test]
    fn test_blank_lines_are_not_frames() {
        let mut reader = FrameReader::new();
        let frames = reader.feed(b"\n\ndata: x\n\n\n");
        assert_eq!(frames, vec!["data: x"]);
    }

    #[test]
    fn test_finish_flushes_unterminated_tail() {
        let mut reader = FrameReader::new();
        assert!(reader.feed(b"data: trailing").is_empty());
        assert_eq!(reader.finish(), Some("data: trailing".to_string()));
        // A second flush yields nothing.
        assert_eq!(reader.finish(), None);
    }

    #[test]
    fn test_no_frame_is_emitted_twice() {
        let mut reader = FrameReader::new();
        let first = reader.feed(b"data: once\n");
        assert_eq!(first.len(), 1);
        assert!(reader.feed(b"").is_empty());
        assert_eq!(reader.finish(), None);
    }
}
