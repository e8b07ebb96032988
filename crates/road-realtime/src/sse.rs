//! Incremental Server-Sent Events decoder.
//!
//! Bytes arrive in arbitrary chunks; [`SseDecoder::push`] buffers them and
//! returns every frame completed by the chunk. A frame ends at a blank line.
//! Multiple `data:` lines are joined with `\n`. Comment lines (leading `:`)
//! and the `id` and `retry` fields are ignored. Both LF and CRLF line endings
//! are accepted.

use road_core::events::RealtimeEvent;

use crate::error::ClientError;

/// One dispatched SSE frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    /// Value of the `event:` field, if the server set one.
    pub event: Option<String>,
    pub data: String,
}

impl SseFrame {
    /// Parse the frame's data as a realtime envelope.
    ///
    /// # Errors
    ///
    /// `Decode` when the data is not a valid envelope.
    pub fn decode(&self) -> Result<RealtimeEvent, ClientError> {
        serde_json::from_str(&self.data).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and collect the frames it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches('\n').trim_end_matches('\r');
            if let Some(frame) = self.process_line(line) {
                frames.push(frame);
            }
        }
        frames
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame { event, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use road_core::events::EventKind;

    #[test]
    fn single_frame() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(b"data: {\"a\":1}\n\n");
        assert_eq!(
            frames,
            vec![SseFrame {
                event: None,
                data: "{\"a\":1}".into()
            }]
        );
    }

    #[test]
    fn frame_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: hel").is_empty());
        assert!(decoder.push(b"lo\n").is_empty());
        let frames = decoder.push(b"\ndata: next\n\n");
        let data: Vec<&str> = frames.iter().map(|f| f.data.as_str()).collect();
        assert_eq!(data, vec!["hello", "next"]);
    }

    #[test]
    fn multi_line_data_and_crlf() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(b"event: update\r\ndata: line1\r\ndata: line2\r\n\r\n");
        assert_eq!(frames[0].event.as_deref(), Some("update"));
        assert_eq!(frames[0].data, "line1\nline2");
    }

    #[rstest::rstest]
    #[case::one_space(b"data: x\n\n".as_slice(), "x")]
    #[case::no_space(b"data:x\n\n".as_slice(), "x")]
    #[case::only_first_space_stripped(b"data:  x\n\n".as_slice(), " x")]
    #[case::crlf(b"data: x\r\n\r\n".as_slice(), "x")]
    #[case::bare_field(b"data\ndata: x\n\n".as_slice(), "\nx")]
    fn data_field_values(#[case] input: &[u8], #[case] expected: &str) {
        let frames = SseDecoder::new().push(input);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, expected);
    }

    #[test]
    fn comments_and_empty_frames_are_skipped() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(b": keep-alive\n\nid: 7\nretry: 10\n\ndata:x\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "x");
    }

    #[test]
    fn decodes_envelope_ignoring_unknown_fields() {
        let frame = SseFrame {
            event: None,
            data: r#"{"type":"project_update","data":{"id":"prj-1"},"timestamp":"2026-05-01T00:00:00Z","projectId":"prj-1","v":2}"#.into(),
        };
        let event = frame.decode().unwrap();
        assert_eq!(event.kind, EventKind::ProjectUpdate);
        assert_eq!(event.project_id.as_deref(), Some("prj-1"));
    }

    #[test]
    fn multibyte_character_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        let bytes = "data: Kokopo café\n\n".as_bytes();
        let split = bytes.iter().position(|b| *b == 0xC3).unwrap() + 1;
        assert!(decoder.push(&bytes[..split]).is_empty());
        let frames = decoder.push(&bytes[split..]);
        assert_eq!(frames[0].data, "Kokopo café");
    }

    #[test]
    fn bad_json_is_a_decode_error() {
        let frame = SseFrame {
            event: None,
            data: "not json".into(),
        };
        assert!(matches!(frame.decode(), Err(ClientError::Decode(_))));
    }
}
