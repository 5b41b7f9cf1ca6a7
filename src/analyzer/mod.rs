//! Analysis session orchestration.
//!
//! This module drives the detection call and the streamed remediation call
//! for one Dockerfile.

pub mod orchestrator;
pub mod session;

pub use orchestrator::{Analyzer, AnalyzerConfig};
pub use session::SessionOutcome;
