//! Newline-delimited frame decoding.
//!
//! Bytes arrive in arbitrary network chunks. The decoder carries incomplete
//! UTF-8 sequences and unterminated lines over to the next chunk, so the
//! frames it yields do not depend on where the chunk boundaries fall.

use tracing::{debug, warn};

const DELIMITER: char = '\n';

/// Longest frame kept, in bytes. Longer lines are skipped up to the next delimiter.
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Turns successive byte chunks of one response body into text frames.
#[derive(Debug)]
pub struct FrameDecoder {
    /// Trailing bytes of a multi-byte character split by a chunk boundary.
    pending: Vec<u8>,
    /// Text after the last delimiter seen so far.
    leftover: String,
    max_frame: usize,
    /// Set while skipping the rest of an oversized line.
    discarding: bool,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::with_max_frame(MAX_FRAME_BYTES)
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_frame(max_frame: usize) -> Self {
        Self {
            pending: Vec::new(),
            leftover: String::new(),
            max_frame,
            discarding: false,
        }
    }

    /// Feed one chunk and return every frame it completes, in order.
    ///
    /// An empty chunk is accepted and yields nothing new.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        // Text buffered before this chunk holds no delimiter.
        let mut search = self.leftover.len();
        self.decode(chunk);

        let mut frames = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.leftover[search..].find(DELIMITER) {
            let end = search + offset;
            if self.discarding {
                self.discarding = false;
            } else if end - start > self.max_frame {
                warn!("Skipping stream frame longer than {} bytes", self.max_frame);
            } else {
                frames.push(self.leftover[start..end].to_string());
            }
            start = end + DELIMITER.len_utf8();
            search = start;
        }
        self.leftover.drain(..start);

        if self.leftover.len() > self.max_frame {
            if !self.discarding {
                warn!(
                    "Skipping stream frame longer than {} bytes",
                    self.max_frame
                );
            }
            self.leftover.clear();
            self.discarding = true;
        }

        frames
    }

    /// End of stream. Whatever was not terminated by a delimiter is
    /// discarded; it is returned only so the caller can log it.
    pub fn finish(&mut self) -> Option<String> {
        let mut rest = std::mem::take(&mut self.leftover);
        if !self.pending.is_empty() {
            rest.push_str(&String::from_utf8_lossy(&self.pending));
            self.pending.clear();
        }
        self.discarding = false;

        if rest.is_empty() {
            None
        } else {
            debug!("Discarding {} unterminated bytes at end of stream", rest.len());
            Some(rest)
        }
    }

    /// Length of buffered, not yet delimited text.
    #[cfg(test)]
    fn buffered(&self) -> usize {
        self.leftover.len() + self.pending.len()
    }

    fn decode(&mut self, chunk: &[u8]) {
        let bytes = if self.pending.is_empty() {
            chunk.to_vec()
        } else {
            let mut joined = std::mem::take(&mut self.pending);
            joined.extend_from_slice(chunk);
            joined
        };

        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    self.leftover.push_str(text);
                    return;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    self.leftover.push_str(&String::from_utf8_lossy(valid));

                    match err.error_len() {
                        // Invalid sequence in the middle: replace and keep going.
                        Some(len) => {
                            self.leftover.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        // Truncated sequence at the end: wait for more bytes.
                        None => {
                            self.pending = after.to_vec();
                            return;
                        }
                    }
                }
            }
        }
    }
}
