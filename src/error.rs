//! Error types for an analysis session.

use thiserror::Error;

/// Errors that end an analysis session.
///
/// Every variant is terminal and user-visible. Malformed stream frames are
/// not represented here; they are recovered inside the accumulator.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// No Dockerfile text was supplied
    #[error("Dockerfile code or file not selected")]
    EmptyInput,

    /// The detection request could not be sent or its body could not be read
    #[error("Detection request failed: {0}")]
    Detection(String),

    /// The detection service answered with a non-success status
    #[error("Detection service returned {status}: {body}")]
    DetectionStatus { status: String, body: String },

    /// The remediation request could not be sent
    #[error("Remediation request failed: {0}")]
    Remediation(String),

    /// The remediation service answered without a usable body
    #[error("No response body found: {0}")]
    MissingBody(String),

    /// Reading the remediation stream failed mid-way
    #[error("Remediation stream failed: {0}")]
    Stream(String),
}

impl AnalysisError {
    /// Whether this error was raised before any network activity.
    pub fn is_input_error(&self) -> bool {
        matches!(self, AnalysisError::EmptyInput)
    }
}
