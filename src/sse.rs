// src/sse.rs
// Incremental SSE record reader.
//
// Both ends of the relay consume `data: <payload>` records off a byte
// stream: the server reads the Gemini response body, the client reads the
// relay response body. Read boundaries fall wherever the transport likes,
// so the reader keeps raw bytes in a buffer, scans for the blank-line
// record delimiter, and only decodes complete records. A multi-byte UTF-8
// character or the delimiter itself split across two reads is therefore
// handled correctly.

use std::collections::VecDeque;

use tracing::warn;

/// Reassembles `data:` payloads from an SSE byte stream.
///
/// Feed raw chunks with [`push`](Self::push), drain complete payloads with
/// [`next_payload`](Self::next_payload), and call
/// [`finish`](Self::finish) once the underlying stream reports EOF to flush
/// a trailing record that never got its delimiter.
#[derive(Debug, Default)]
pub struct SseRecordReader {
    buffer: Vec<u8>,
    pending: VecDeque<String>,
}

impl SseRecordReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes from the transport.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Next complete `data:` payload, if one is buffered.
    pub fn next_payload(&mut self) -> Option<String> {
        loop {
            if let Some(payload) = self.pending.pop_front() {
                return Some(payload);
            }
            let (end, skip) = self.find_delimiter()?;
            let record: Vec<u8> = self.buffer.drain(..end + skip).take(end).collect();
            if let Some(payload) = parse_record(&record) {
                self.pending.push_back(payload);
            }
        }
    }

    /// Flush the trailing record once the stream has ended.
    ///
    /// The upstream is not required to terminate its last record with a
    /// blank line before closing the connection.
    pub fn finish(&mut self) -> Option<String> {
        if let Some(payload) = self.pending.pop_front() {
            return Some(payload);
        }
        if self.buffer.is_empty() {
            return None;
        }
        let record = std::mem::take(&mut self.buffer);
        parse_record(&record)
    }

    /// Find the blank-line record delimiter: `\n\n` or `\n\r\n` (which also
    /// covers `\r\n\r\n`, the record then carrying a trailing `\r` that
    /// per-line parsing trims). Returns (record length, delimiter length).
    fn find_delimiter(&self) -> Option<(usize, usize)> {
        let buf = &self.buffer;
        let mut i = 0;
        while i + 1 < buf.len() {
            if buf[i] == b'\n' {
                if buf[i + 1] == b'\n' {
                    return Some((i, 2));
                }
                if buf[i + 1] == b'\r' && buf.get(i + 2) == Some(&b'\n') {
                    return Some((i, 3));
                }
            }
            i += 1;
        }
        None
    }
}

/// Extract the `data:` payload from one complete record.
///
/// Comment lines (leading `:`) and non-`data` fields are ignored; multiple
/// `data` lines in one record are joined with `\n`, as event-stream
/// parsers are required to do. A
/// record that is not valid UTF-8 is logged and dropped without aborting
/// the stream.
fn parse_record(record: &[u8]) -> Option<String> {
    let text = match std::str::from_utf8(record) {
        Ok(text) => text,
        Err(e) => {
            warn!("dropping SSE record with invalid UTF-8: {}", e);
            return None;
        }
    };

    let mut payload: Option<String> = None;
    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("data:") {
            let value = rest.strip_prefix(' ').unwrap_or(rest);
            match payload {
                Some(ref mut joined) => {
                    joined.push('\n');
                    joined.push_str(value);
                }
                None => payload = Some(value.to_string()),
            }
        }
    }
    payload
}
