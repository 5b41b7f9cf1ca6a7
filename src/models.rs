//! Data models for the Dockerfile analyzer.
//!
//! This module contains the wire payloads exchanged with the detection and
//! remediation services, plus the structures used for reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Risk categories the remediation service knows how to explain.
pub const KNOWN_RISK_TYPES: [&str; 10] = [
    "root-privilege-user",
    "use-sudo-run",
    "yum-install-without-version",
    "apt-install-without-version",
    "pip-install-without-version",
    "use-add-instead-of-copy",
    "use-deprecated-maintainer",
    "miss-apt-no-install-recommends",
    "miss-specific-tags",
    "use-cd-change-dir",
];

/// Sentinel offset meaning "position unknown".
pub const UNKNOWN_POSITION: i64 = -1;

/// A single risk reported by the detection service.
///
/// Offsets are passed through exactly as received, sentinels included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFinding {
    /// Category tag, e.g. `miss-specific-tags`.
    #[serde(rename = "risk_type")]
    pub category: String,
    /// Excerpt of the Dockerfile that triggered the finding.
    pub snippet: String,
    /// Character offset where the snippet starts, or `-1`.
    pub start: i64,
    /// Character offset where the snippet ends, or `-1`.
    pub end: i64,
}

impl RiskFinding {
    /// Returns the character range when both offsets are known.
    pub fn position(&self) -> Option<(u64, u64)> {
        if self.start == UNKNOWN_POSITION || self.end == UNKNOWN_POSITION {
            return None;
        }
        let start = u64::try_from(self.start).ok()?;
        let end = u64::try_from(self.end).ok()?;
        Some((start, end))
    }

    /// Human-readable position, e.g. `character 0-18`.
    pub fn position_label(&self) -> String {
        match self.position() {
            Some((start, end)) => format!("character {}-{}", start, end),
            None => "without position".to_string(),
        }
    }

    /// Parsed form of the category tag.
    pub fn kind(&self) -> RiskKind {
        RiskKind::from(self.category.as_str())
    }
}

/// Recognised form of a risk category tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RiskKind {
    /// One of [`KNOWN_RISK_TYPES`].
    Known(&'static str),
    /// Anything else the detector produced.
    Unrecognized(String),
}

impl RiskKind {
    pub fn is_known(&self) -> bool {
        matches!(self, RiskKind::Known(_))
    }
}

impl fmt::Display for RiskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskKind::Known(tag) => write!(f, "{}", tag),
            RiskKind::Unrecognized(tag) => write!(f, "{} (unrecognized)", tag),
        }
    }
}

impl From<&str> for RiskKind {
    fn from(s: &str) -> Self {
        let normalized = s.trim().to_lowercase();
        match KNOWN_RISK_TYPES.iter().find(|known| **known == normalized) {
            Some(&known) => RiskKind::Known(known),
            None => RiskKind::Unrecognized(s.to_string()),
        }
    }
}

/// Body sent to the detection service.
#[derive(Debug, Serialize)]
pub struct DetectionRequest<'a> {
    pub dockerfile_content: &'a str,
}

/// Findings produced once per session by the detection service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingsResult {
    #[serde(default)]
    pub predicted_risks: Vec<RiskFinding>,
}

impl FindingsResult {
    pub fn len(&self) -> usize {
        self.predicted_risks.len()
    }
}

/// Body sent to the remediation service.
#[derive(Debug, Serialize)]
pub struct RemediationRequest<'a> {
    pub dockerfile: &'a str,
    pub predicted_risks: &'a [RiskFinding],
}

/// One decoded line of the remediation stream.
///
/// Extra fields sent by the service are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StreamFragment {
    /// Text to append to the accumulated narrative.
    #[serde(rename = "response")]
    pub response_text: String,
    /// Marks the terminal fragment.
    #[serde(rename = "done", default)]
    pub is_final: bool,
}

/// Summary of the findings of one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindingsSummary {
    /// Total number of findings.
    pub total: usize,
    /// Findings with a known character range.
    pub positioned: usize,
    /// Findings whose category the remediation service does not know.
    pub unrecognized: usize,
    /// Findings grouped by category tag.
    pub by_category: HashMap<String, usize>,
}

impl FindingsSummary {
    /// Creates a summary from a list of findings.
    pub fn from_findings(findings: &[RiskFinding]) -> Self {
        let mut summary = Self {
            total: findings.len(),
            ..Self::default()
        };

        for finding in findings {
            if finding.position().is_some() {
                summary.positioned += 1;
            }
            if !finding.kind().is_known() {
                summary.unrecognized += 1;
            }
            *summary
                .by_category
                .entry(finding.category.clone())
                .or_insert(0) += 1;
        }

        summary
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    /// The terminal fragment was observed.
    Completed,
    /// The stream ran dry before a terminal fragment arrived.
    Incomplete,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeKind::Completed => write!(f, "Completed"),
            OutcomeKind::Incomplete => write!(f, "Incomplete"),
        }
    }
}

/// Metadata about a session report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Where the Dockerfile came from (path or `<stdin>`).
    pub source: String,
    /// Date and time of the analysis.
    pub analysis_date: DateTime<Utc>,
    /// Detection endpoint used.
    pub detect_url: String,
    /// Remediation endpoint used.
    pub fix_url: String,
    /// Number of stream fragments applied.
    pub fragments: usize,
    /// Duration of the session in seconds.
    pub duration_seconds: f64,
}

/// The complete record of one finished session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub metadata: ReportMetadata,
    pub outcome: OutcomeKind,
    pub findings: Vec<RiskFinding>,
    pub summary: FindingsSummary,
    /// Final accumulated remediation narrative (markdown).
    pub remediation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(category: &str, start: i64, end: i64) -> RiskFinding {
        RiskFinding {
            category: category.to_string(),
            snippet: "FROM ubuntu".to_string(),
            start,
            end,
        }
    }

    #[test]
    fn test_position_label() {
        assert_eq!(
            finding("miss-specific-tags", 0, 11).position_label(),
            "character 0-11"
        );
        assert_eq!(
            finding("miss-specific-tags", -1, -1).position_label(),
            "without position"
        );
        assert_eq!(finding("miss-specific-tags", 4, -1).position(), None);
    }

    #[test]
    fn test_offsets_are_not_validated() {
        let f = finding("use-sudo-run", 20, 5);
        assert_eq!(f.position(), Some((20, 5)));
    }

    #[test]
    fn test_risk_kind_from_str() {
        assert_eq!(
            RiskKind::from("use-sudo-run"),
            RiskKind::Known("use-sudo-run")
        );
        assert_eq!(
            RiskKind::from("USE-SUDO-RUN"),
            RiskKind::Known("use-sudo-run")
        );
        assert_eq!(
            RiskKind::from("exposed-secret"),
            RiskKind::Unrecognized("exposed-secret".to_string())
        );
    }

    #[test]
    fn test_findings_wire_format() {
        let body = r#"{"predicted_risks":[{"risk_type":"miss-specific-tags","snippet":"FROM ubuntu","start":0,"end":11},{"risk_type":"root-privilege-user","snippet":"","start":-1,"end":-1}]}"#;
        let findings: FindingsResult = serde_json::from_str(body).unwrap();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings.predicted_risks[1].start, -1);

        let request = RemediationRequest {
            dockerfile: "FROM ubuntu\n",
            predicted_risks: &findings.predicted_risks,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["predicted_risks"][0]["risk_type"], "miss-specific-tags");
        assert_eq!(json["predicted_risks"][1]["end"], -1);
        assert_eq!(json["dockerfile"], "FROM ubuntu\n");
    }

    #[test]
    fn test_fragment_ignores_extra_fields() {
        let fragment: StreamFragment =
            serde_json::from_str(r#"{"response":"ok","done":true,"model":"qwen"}"#).unwrap();
        assert_eq!(fragment.response_text, "ok");
        assert!(fragment.is_final);

        let fragment: StreamFragment = serde_json::from_str(r#"{"response":"x"}"#).unwrap();
        assert!(!fragment.is_final);
    }

    #[test]
    fn test_findings_summary() {
        let findings = vec![
            finding("miss-specific-tags", 0, 11),
            finding("miss-specific-tags", -1, -1),
            finding("exposed-secret", 3, 9),
        ];

        let summary = FindingsSummary::from_findings(&findings);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.positioned, 2);
        assert_eq!(summary.unrecognized, 1);
        assert_eq!(summary.by_category.get("miss-specific-tags"), Some(&2));
    }
}
