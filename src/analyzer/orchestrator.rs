//! Two-phase analysis orchestration.
//!
//! One session makes two strictly sequential calls:
//! - Detection: post the Dockerfile, receive the predicted risks
//! - Remediation: post the Dockerfile and the risks, stream back a markdown
//!   narrative as newline-delimited JSON fragments

use crate::analyzer::session::{AnalysisSession, SessionOutcome, SessionState};
use crate::error::AnalysisError;
use crate::models::{DetectionRequest, FindingsResult, RemediationRequest, RiskFinding};
use crate::sink::{Notice, PresentationSink};
use crate::stream::{FrameDecoder, FrameOutcome};
use anyhow::{Context, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for the analyzer.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub detect_url: String,
    pub fix_url: String,
    /// Applies to the whole detection call and to connecting for remediation.
    /// The remediation stream itself is never cut off.
    pub timeout_seconds: u64,
}

/// Runs analysis sessions against the detection and remediation services.
///
/// The analyzer holds no per-session state. Each call to [`Analyzer::run`]
/// creates its own [`AnalysisSession`].
pub struct Analyzer {
    config: AnalyzerConfig,
    http_client: reqwest::Client,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        info!(
            "Initializing analyzer (detect: {}, fix: {})",
            config.detect_url, config.fix_url
        );

        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Analyze one Dockerfile, reporting progress to `sink`.
    ///
    /// Failures are reported to the sink exactly once before being returned.
    pub async fn run<S>(
        &self,
        input: &str,
        sink: &mut S,
    ) -> Result<SessionOutcome, AnalysisError>
    where
        S: PresentationSink + ?Sized,
    {
        let mut session = AnalysisSession::new(input);

        match self.drive(&mut session, sink).await {
            Ok(()) => Ok(session.into_outcome()),
            Err(e) => {
                session.advance(SessionState::Failed);
                if e.is_input_error() {
                    sink.notify(Notice::Warning(e.to_string()));
                } else {
                    warn!("Analysis failed: {}", e);
                    sink.notify(Notice::Error(e.to_string()));
                }
                Err(e)
            }
        }
    }

    async fn drive<S>(
        &self,
        session: &mut AnalysisSession,
        sink: &mut S,
    ) -> Result<(), AnalysisError>
    where
        S: PresentationSink + ?Sized,
    {
        if session.input().trim().is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        session.advance(SessionState::DetectionInFlight);
        sink.notify(Notice::Progress("Analyzing Dockerfile security...".to_string()));
        let findings = self.detect(session.input()).await?;
        info!("Detection returned {} findings", findings.len());
        sink.notify(Notice::Info(format!(
            "{} potential risk(s) detected",
            findings.len()
        )));
        session.set_findings(findings);

        session.advance(SessionState::RemediationInFlight);
        sink.notify(Notice::Progress("Waiting for remediation advice...".to_string()));
        let response = self
            .open_remediation(session.input(), session.findings())
            .await?;

        consume_stream(session, response.bytes_stream(), sink).await
    }

    /// Call the detection service.
    async fn detect(&self, dockerfile: &str) -> Result<FindingsResult, AnalysisError> {
        debug!("Posting {} bytes to {}", dockerfile.len(), self.config.detect_url);

        let response = self
            .http_client
            .post(&self.config.detect_url)
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .json(&DetectionRequest {
                dockerfile_content: dockerfile,
            })
            .send()
            .await
            .map_err(|e| {
                AnalysisError::Detection(self.describe_send_error(&e, &self.config.detect_url))
            })?;

        if !response.status().is_success() {
            let status = response.status().to_string();
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::DetectionStatus { status, body });
        }

        response
            .json::<FindingsResult>()
            .await
            .map_err(|e| {
                AnalysisError::Detection(format!("Failed to parse detection response: {}", e))
            })
    }

    /// Call the remediation service and return the response whose body is the stream.
    async fn open_remediation(
        &self,
        dockerfile: &str,
        findings: &[RiskFinding],
    ) -> Result<reqwest::Response, AnalysisError> {
        debug!(
            "Posting {} findings to {}",
            findings.len(),
            self.config.fix_url
        );

        let response = self
            .http_client
            .post(&self.config.fix_url)
            .json(&RemediationRequest {
                dockerfile,
                predicted_risks: findings,
            })
            .send()
            .await
            .map_err(|e| {
                AnalysisError::Remediation(self.describe_send_error(&e, &self.config.fix_url))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Remediation(format!(
                "service returned {}: {}",
                status, body
            )));
        }

        if response.content_length() == Some(0) {
            return Err(AnalysisError::MissingBody(format!(
                "{} answered with an empty body",
                self.config.fix_url
            )));
        }

        Ok(response)
    }

    fn describe_send_error(&self, e: &reqwest::Error, url: &str) -> String {
        if e.is_timeout() {
            format!("Request timed out after {}s", self.config.timeout_seconds)
        } else if e.is_connect() {
            format!("Cannot connect to {}", url)
        } else {
            format!("Failed to send request: {}", e)
        }
    }
}

/// Read the remediation body to its terminal fragment.
///
/// Each chunk goes through a [`FrameDecoder`]; every complete frame is offered
/// to the session, and the sink sees the full accumulated text after each
/// applied fragment. Reading stops as soon as the terminal fragment arrives.
pub async fn consume_stream<St, E, S>(
    session: &mut AnalysisSession,
    stream: St,
    sink: &mut S,
) -> Result<(), AnalysisError>
where
    St: Stream<Item = std::result::Result<Bytes, E>>,
    E: Display,
    S: PresentationSink + ?Sized,
{
    session.advance(SessionState::Streaming);
    futures::pin_mut!(stream);

    let mut decoder = FrameDecoder::new();
    let mut dropped = 0usize;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| AnalysisError::Stream(e.to_string()))?;

        for frame in decoder.push(&chunk) {
            match session.accept_frame(&frame) {
                FrameOutcome::Applied { is_final } => {
                    sink.render(session.text());
                    if is_final {
                        session.advance(SessionState::Completed);
                        info!("Remediation complete ({} bytes)", session.text().len());
                        sink.notify(Notice::Completed);
                        return Ok(());
                    }
                }
                FrameOutcome::Dropped(_) => dropped += 1,
                FrameOutcome::Closed => return Ok(()),
            }
        }
    }

    if let Some(rest) = decoder.finish() {
        debug!("Unterminated tail ignored: {:?}", rest);
    }

    session.advance(SessionState::Completed);
    warn!(
        "Remediation stream ended without a terminal fragment ({} frames skipped)",
        dropped
    );
    sink.notify(Notice::Warning(
        "Remediation stream ended before the analysis was marked complete".to_string(),
    ));
    Ok(())
}
