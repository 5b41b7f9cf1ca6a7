//! Fragment parsing and accumulation.

use crate::models::StreamFragment;
use std::fmt;
use tracing::{debug, warn};

/// Longest frame excerpt kept in a parse error.
const EXCERPT_CHARS: usize = 80;

/// A frame that could not be decoded as a [`StreamFragment`].
///
/// Never surfaced to the user; the frame is skipped and the session goes on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameParseError {
    pub excerpt: String,
    pub reason: String,
}

impl fmt::Display for FrameParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unparsable frame {:?}: {}", self.excerpt, self.reason)
    }
}

impl std::error::Error for FrameParseError {}

/// Result of offering one frame to the accumulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The fragment was appended. `is_final` marks the terminal fragment.
    Applied { is_final: bool },
    /// The frame was malformed and skipped.
    Dropped(FrameParseError),
    /// A terminal fragment was already seen; nothing more is accepted.
    Closed,
}

/// Append-only remediation text for one session.
#[derive(Debug, Default)]
pub struct FragmentAccumulator {
    text: String,
    fragments: usize,
    done: bool,
}

impl FragmentAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one frame and append its text.
    ///
    /// Malformed frames leave the accumulated text untouched.
    pub fn accept(&mut self, frame: &str) -> FrameOutcome {
        if self.done {
            return FrameOutcome::Closed;
        }

        let frame = frame.trim();
        let fragment: StreamFragment = match serde_json::from_str(frame) {
            Ok(fragment) => fragment,
            Err(e) => {
                let error = FrameParseError {
                    excerpt: frame.chars().take(EXCERPT_CHARS).collect(),
                    reason: e.to_string(),
                };
                warn!("Skipping stream frame: {}", error);
                return FrameOutcome::Dropped(error);
            }
        };

        self.text.push_str(&fragment.response_text);
        self.fragments += 1;

        if fragment.is_final {
            debug!("Terminal fragment after {} fragments", self.fragments);
            self.done = true;
        }

        FrameOutcome::Applied {
            is_final: fragment.is_final,
        }
    }

    /// Text accumulated so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of fragments applied.
    pub fn fragments(&self) -> usize {
        self.fragments
    }

    /// Whether the terminal fragment has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(frames: &[&str]) -> FragmentAccumulator {
        let mut acc = FragmentAccumulator::new();
        for frame in frames {
            acc.accept(frame);
        }
        acc
    }

    #[test]
    fn test_appends_in_order() {
        let mut acc = FragmentAccumulator::new();
        assert_eq!(
            acc.accept(r#"{"response":"Use a pinned "}"#),
            FrameOutcome::Applied { is_final: false }
        );
        assert_eq!(acc.text(), "Use a pinned ");
        assert_eq!(
            acc.accept(r#"{"response":"base image.","done":true}"#),
            FrameOutcome::Applied { is_final: true }
        );
        assert_eq!(acc.text(), "Use a pinned base image.");
        assert_eq!(acc.fragments(), 2);
        assert!(acc.is_done());
    }

    #[test]
    fn test_nothing_accepted_after_terminal_fragment() {
        let mut acc = feed(&[r#"{"response":"a","done":true}"#]);
        assert_eq!(acc.accept(r#"{"response":"b"}"#), FrameOutcome::Closed);
        assert_eq!(acc.text(), "a");
        assert_eq!(acc.fragments(), 1);
    }

    #[test]
    fn test_malformed_frame_is_dropped() {
        let mut acc = feed(&[r#"{"response":"a"}"#]);
        let outcome = acc.accept(r#"{"response":"par"#);
        assert!(matches!(outcome, FrameOutcome::Dropped(_)));
        assert_eq!(acc.text(), "a");
        assert!(!acc.is_done());
    }

    #[test]
    fn test_inserted_garbage_does_not_change_result() {
        let clean = [
            r#"{"response":"one "}"#,
            r#"{"response":"two "}"#,
            r#"{"response":"three","done":true}"#,
        ];

        for at in 0..=clean.len() {
            let mut noisy: Vec<&str> = clean.to_vec();
            noisy.insert(at, "not json at all");
            assert_eq!(feed(&noisy).text(), feed(&clean).text(), "garbage at {}", at);
        }
    }

    #[test]
    fn test_missing_response_field_is_malformed() {
        let mut acc = FragmentAccumulator::new();
        assert!(matches!(
            acc.accept(r#"{"done":true}"#),
            FrameOutcome::Dropped(_)
        ));
        assert!(matches!(acc.accept(""), FrameOutcome::Dropped(_)));
    }

    #[test]
    fn test_frames_are_trimmed() {
        let acc = feed(&["  {\"response\":\"x\"}\r"]);
        assert_eq!(acc.text(), "x");
    }

    #[test]
    fn test_text_only_grows() {
        let frames = [
            r#"{"response":"a"}"#,
            "garbage",
            r#"{"response":""}"#,
            r#"{"response":"bc"}"#,
        ];
        let mut acc = FragmentAccumulator::new();
        let mut previous = String::new();
        for frame in frames {
            acc.accept(frame);
            assert!(acc.text().starts_with(&previous));
            previous = acc.text().to_string();
        }
        assert_eq!(acc.into_text(), "abc");
    }
}
