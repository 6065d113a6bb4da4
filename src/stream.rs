/// Prefix that marks a protocol payload line in the event stream.
pub const DATA_PREFIX: &str = "data: ";

/// Incremental line splitter for the `text/event-stream` response body.
///
/// Fragments can end anywhere, including in the middle of a multibyte
/// character, so the residual is kept as raw bytes until a `\n` arrives.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    buffer: Vec<u8>,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one fragment and return every `data: ` line it completed, in order.
    pub fn push(&mut self, fragment: &[u8]) -> Vec<String> {
        // The buffer never holds a newline between calls, so only the new bytes are searched
        let offset = self.buffer.len();
        self.buffer.extend_from_slice(fragment);

        let Some(last_newline) = fragment.iter().rposition(|b| *b == b'\n').map(|p| offset + p) else {
            return Vec::new();
        };

        // Everything after the last newline stays buffered
        let rest = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, rest);

        complete
            .split(|b| *b == b'\n')
            .filter_map(|segment| {
                let segment = segment.strip_suffix(b"\r").unwrap_or(segment);
                let line = String::from_utf8_lossy(segment);
                is_payload_line(&line).then(|| line.into_owned())
            })
            .collect()
    }

    /// Bytes received after the last newline that are still waiting for one.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// End of input. An unterminated trailing line is never emitted; it is
    /// handed back only so the caller can report what was dropped.
    pub fn finish(self) -> Option<String> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&self.buffer).into_owned())
        }
    }
}

/// True for non-blank lines carrying the exact `data: ` prefix.
pub fn is_payload_line(line: &str) -> bool {
    !line.trim().is_empty() && line.starts_with(DATA_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_yields_complete_lines_only() {
        let mut decoder = StreamDecoder::new();
        assert!(decoder.push(b"data: {\"a\"").is_empty());
        assert_eq!(decoder.pending(), 10);

        let lines = decoder.push(b":1}\ndata: {\"b\":2}\ndata: tail");
        assert_eq!(lines, vec!["data: {\"a\":1}", "data: {\"b\":2}"]);
        assert_eq!(decoder.finish().as_deref(), Some("data: tail"));
    }

    #[test]
    fn test_ignores_non_payload_lines() {
        let mut decoder = StreamDecoder::new();
        let lines = decoder.push(b": keep-alive\nevent: chunk\n\ndata:no-space\n   \ndata: {}\n");
        assert_eq!(lines, vec!["data: {}"]);
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn test_strips_carriage_returns() {
        let mut decoder = StreamDecoder::new();
        let lines = decoder.push(b"data: one\r\ndata: two\r\n");
        assert_eq!(lines, vec!["data: one", "data: two"]);
    }

    #[test]
    fn test_multibyte_character_split_across_fragments() {
        let line = "data: {\"code\":\"é\"}\n".as_bytes();
        let split = line.iter().position(|b| *b == 0xC3).unwrap() + 1;

        let mut decoder = StreamDecoder::new();
        assert!(decoder.push(&line[..split]).is_empty());
        let lines = decoder.push(&line[split..]);
        assert_eq!(lines, vec!["data: {\"code\":\"é\"}"]);
    }

    #[test]
    fn test_long_line_in_byte_fragments() {
        let line = format!("data: {{\"code\":\"{}\"}}\n", "x".repeat(4096));
        let mut decoder = StreamDecoder::new();
        let mut decoded = Vec::new();
        for (i, byte) in line.as_bytes().iter().enumerate() {
            decoded.extend(decoder.push(std::slice::from_ref(byte)));
            if i + 1 < line.len() {
                assert_eq!(decoder.pending(), i + 1);
            }
        }
        assert_eq!(decoded, vec![line.trim_end().to_string()]);
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_trailing_unterminated_line_is_dropped() {
        let mut decoder = StreamDecoder::new();
        assert!(decoder.push(b"data: {\"code\":\"x\",\"file\":\"a.ts\"}").is_empty());
        let dropped = decoder.finish();
        assert!(dropped.is_some_and(|d| d.starts_with("data: ")));
    }

    proptest! {
        #[test]
        fn prop_split_line_decodes_once(
            body in "[a-zA-Z0-9 {}:,\"]{1,64}",
            cuts in proptest::collection::vec(any::<prop::sample::Index>(), 0..16),
        ) {
            let line = format!("data: {body}\n");
            let bytes = line.as_bytes();

            let mut points: Vec<usize> = cuts.iter().map(|c| c.index(bytes.len())).collect();
            points.push(0);
            points.push(bytes.len());
            points.sort_unstable();
            points.dedup();

            let mut decoder = StreamDecoder::new();
            let mut decoded = Vec::new();
            for pair in points.windows(2) {
                decoded.extend(decoder.push(&bytes[pair[0]..pair[1]]));
            }

            prop_assert_eq!(decoded, vec![format!("data: {body}")]);
            prop_assert!(decoder.finish().is_none());
        }
    }
}
