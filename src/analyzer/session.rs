//! Per-invocation session state.
//!
//! A session is an independent value owned by whoever started the analysis.
//! Nothing in it is shared, so separate sessions never observe each other.

use crate::models::{FindingsResult, OutcomeKind, RiskFinding};
use crate::stream::{FragmentAccumulator, FrameOutcome};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::debug;

/// Lifecycle of a session. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    Idle,
    DetectionInFlight,
    RemediationInFlight,
    Streaming,
    Completed,
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::DetectionInFlight => "detection in flight",
            SessionState::RemediationInFlight => "remediation in flight",
            SessionState::Streaming => "streaming",
            SessionState::Completed => "completed",
            SessionState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Everything one analysis owns from input to terminal outcome.
#[derive(Debug)]
pub struct AnalysisSession {
    input: String,
    findings: FindingsResult,
    accumulator: FragmentAccumulator,
    state: SessionState,
    started: Instant,
}

impl AnalysisSession {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            findings: FindingsResult::default(),
            accumulator: FragmentAccumulator::new(),
            state: SessionState::Idle,
            started: Instant::now(),
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    #[cfg(test)]
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn findings(&self) -> &[RiskFinding] {
        &self.findings.predicted_risks
    }

    pub(crate) fn set_findings(&mut self, findings: FindingsResult) {
        self.findings = findings;
    }

    /// Move to `next`. Returns `false` when the move would go backwards or
    /// the session already reached a terminal state.
    pub(crate) fn advance(&mut self, next: SessionState) -> bool {
        if self.state.is_terminal() || next <= self.state {
            debug!("Ignoring session transition {} -> {}", self.state, next);
            return false;
        }
        debug!("Session {} -> {}", self.state, next);
        self.state = next;
        true
    }

    /// Offer one stream frame to the session's accumulator.
    pub(crate) fn accept_frame(&mut self, frame: &str) -> FrameOutcome {
        self.accumulator.accept(frame)
    }

    /// Remediation text accumulated so far.
    pub fn text(&self) -> &str {
        self.accumulator.text()
    }

    /// Consume a completed session.
    pub fn into_outcome(self) -> SessionOutcome {
        let kind = if self.accumulator.is_done() {
            OutcomeKind::Completed
        } else {
            OutcomeKind::Incomplete
        };

        SessionOutcome {
            kind,
            fragments: self.accumulator.fragments(),
            elapsed: self.started.elapsed(),
            findings: self.findings,
            remediation: self.accumulator.into_text(),
        }
    }
}

/// What a finished session hands back to its caller.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub kind: OutcomeKind,
    pub findings: FindingsResult,
    pub remediation: String,
    pub fragments: usize,
    pub elapsed: Duration,
}

impl SessionOutcome {
    pub fn is_completed(&self) -> bool {
        self.kind == OutcomeKind::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_only_move_forward() {
        let mut session = AnalysisSession::new("FROM alpine");
        assert!(session.advance(SessionState::DetectionInFlight));
        assert!(session.advance(SessionState::RemediationInFlight));
        assert!(!session.advance(SessionState::DetectionInFlight));
        assert!(session.advance(SessionState::Streaming));
        assert_eq!(session.state(), SessionState::Streaming);
    }

    #[test]
    fn test_terminal_state_is_reached_once() {
        let mut session = AnalysisSession::new("FROM alpine");
        assert!(session.advance(SessionState::Completed));
        assert!(!session.advance(SessionState::Completed));
        assert!(!session.advance(SessionState::Failed));
        assert_eq!(session.state(), SessionState::Completed);
    }

    #[test]
    fn test_failure_can_happen_from_any_live_state() {
        let mut session = AnalysisSession::new("FROM alpine");
        session.advance(SessionState::DetectionInFlight);
        assert!(session.advance(SessionState::Failed));
        assert!(session.state().is_terminal());
    }

    #[test]
    fn test_outcome_reflects_terminal_fragment() {
        let mut session = AnalysisSession::new("FROM alpine");
        session.accept_frame(r#"{"response":"partial"}"#);
        let outcome = session.into_outcome();
        assert_eq!(outcome.kind, OutcomeKind::Incomplete);
        assert_eq!(outcome.remediation, "partial");

        let mut session = AnalysisSession::new("FROM alpine");
        session.accept_frame(r#"{"response":"all","done":true}"#);
        let outcome = session.into_outcome();
        assert!(outcome.is_completed());
        assert_eq!(outcome.fragments, 1);
    }

    #[test]
    fn test_sessions_do_not_share_text() {
        let mut first = AnalysisSession::new("FROM a");
        let second = AnalysisSession::new("FROM b");
        first.accept_frame(r#"{"response":"only mine"}"#);
        assert_eq!(first.text(), "only mine");
        assert_eq!(second.text(), "");
    }
}
