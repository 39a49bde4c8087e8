//! Incremental decoder for the assistant's server-sent event stream.
//!
//! Each record is a `data: <json>` line whose text fragment sits at
//! `choices[0].delta.content`. `data: [DONE]` ends the stream.

use serde_json::Value;
use tracing::warn;

const DATA_PREFIX: &str = "data: ";
const DONE_MARKER: &str = "[DONE]";

/// Buffers raw bytes and yields text fragments as complete lines arrive.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    pending: Vec<u8>,
    buffer: String,
    done: bool,
    malformed: usize,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once `[DONE]` has been seen; further input is ignored.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Number of `data:` records whose payload was not valid JSON.
    pub fn malformed(&self) -> usize {
        self.malformed
    }

    /// Feed a chunk and return the fragments completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        if self.done {
            return Vec::new();
        }
        self.pending.extend_from_slice(chunk);
        self.decode_pending();

        let mut fragments = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            if let Some(fragment) = self.process_line(&line[..line.len() - 1]) {
                fragments.push(fragment);
            }
            if self.done {
                self.buffer.clear();
                break;
            }
        }
        fragments
    }

    /// Flush a trailing line that arrived without a newline.
    pub fn finish(&mut self) -> Vec<String> {
        if self.done {
            return Vec::new();
        }
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.buffer.push_str(&String::from_utf8_lossy(&rest));
        }
        let line = std::mem::take(&mut self.buffer);
        self.process_line(&line).into_iter().collect()
    }

    fn decode_pending(&mut self) {
        let mut start = 0;
        while start < self.pending.len() {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    start = self.pending.len();
                }
                Err(err) => {
                    let valid = start + err.valid_up_to();
                    self.buffer
                        .push_str(&String::from_utf8_lossy(&self.pending[start..valid]));
                    match err.error_len() {
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            start = valid + len;
                        }
                        None => {
                            // Incomplete sequence at the end; keep it for the next chunk.
                            start = valid;
                            break;
                        }
                    }
                }
            }
        }
        self.pending.drain(..start);
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.starts_with(':') || line.trim().is_empty() {
            return None;
        }
        let payload = line.strip_prefix(DATA_PREFIX)?.trim();
        if payload == DONE_MARKER {
            self.done = true;
            return None;
        }

        match serde_json::from_str::<Value>(payload) {
            Ok(value) => extract_content(&value),
            Err(err) => {
                self.malformed += 1;
                warn!(error = %err, "skipping malformed stream record");
                None
            }
        }
    }
}

fn extract_content(value: &Value) -> Option<String> {
    value
        .get("choices")?
        .get(0)?
        .get("delta")?
        .get("content")?
        .as_str()
        .filter(|content| !content.is_empty())
        .map(str::to_string)
}
