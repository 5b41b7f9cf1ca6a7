//! Session report generation.
//!
//! This module turns a finished session into a Markdown or JSON document.

use crate::analysis::{category_ranking, format_findings_overview, sort_by_position};
use crate::models::{FindingsSummary, OutcomeKind, ReportMetadata, SessionReport};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &SessionReport) -> String {
    let mut output = String::new();

    output.push_str("# DockerSec Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata, report.outcome));
    output.push_str(&generate_summary_section(&report.summary, report));
    output.push_str(&generate_findings_section(report));
    output.push_str(&generate_remediation_section(&report.remediation));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata, outcome: OutcomeKind) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Dockerfile:** `{}`\n", metadata.source));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Detection Service:** {}\n", metadata.detect_url));
    section.push_str(&format!("- **Remediation Service:** {}\n", metadata.fix_url));
    section.push_str(&format!("- **Outcome:** {}\n", outcome));
    section.push_str(&format!("- **Fragments Received:** {}\n", metadata.fragments));
    section.push_str(&format!(
        "- **Analysis Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the summary section.
fn generate_summary_section(summary: &FindingsSummary, report: &SessionReport) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Findings | With Position | Unrecognized |\n");
    section.push_str("|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| **{}** | {} | {} |\n\n",
        summary.total, summary.positioned, summary.unrecognized
    ));

    let ranking = category_ranking(&report.findings);
    if !ranking.is_empty() {
        section.push_str("### Findings by Category\n\n");
        section.push_str("| Category | Count |\n");
        section.push_str("|:---|:---:|\n");
        for (category, count) in ranking {
            section.push_str(&format!("| `{}` | {} |\n", category, count));
        }
        section.push('\n');
    }

    section
}

/// Generate the detected findings section.
fn generate_findings_section(report: &SessionReport) -> String {
    let mut findings = report.findings.clone();
    sort_by_position(&mut findings);

    let mut section = String::new();
    section.push_str("## Detected Risks\n\n");
    section.push_str(&format_findings_overview(&findings));
    section.push_str("\n\n");

    section
}

/// Generate the remediation section.
fn generate_remediation_section(remediation: &str) -> String {
    let mut section = String::new();

    section.push_str("## Remediation\n\n");
    if remediation.trim().is_empty() {
        section.push_str("*No remediation advice was received.*\n\n");
    } else {
        section.push_str(remediation.trim_end());
        section.push_str("\n\n");
    }

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by DockerSec*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &SessionReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
