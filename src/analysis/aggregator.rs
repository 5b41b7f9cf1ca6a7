//! Finding aggregation and formatting.
//!
//! Helpers for presenting the detection results of a session.

use crate::models::RiskFinding;
use std::collections::BTreeMap;

/// Group findings by category tag.
pub fn group_by_category(findings: &[RiskFinding]) -> BTreeMap<String, Vec<RiskFinding>> {
    let mut grouped: BTreeMap<String, Vec<RiskFinding>> = BTreeMap::new();

    for finding in findings {
        grouped
            .entry(finding.category.clone())
            .or_default()
            .push(finding.clone());
    }

    grouped
}

/// Order findings by position; findings without one go last, in their
/// original order.
pub fn sort_by_position(findings: &mut [RiskFinding]) {
    findings.sort_by_key(|f| match f.position() {
        Some((start, end)) => (0, start, end),
        None => (1, 0, 0),
    });
}

/// One line per finding: type, snippet and position.
pub fn format_finding_lines(findings: &[RiskFinding]) -> Vec<String> {
    findings
        .iter()
        .map(|f| {
            format!(
                "- Risk type: {}, Snippet: {}, Position: {}",
                f.kind(),
                f.snippet.replace('\n', "\\n"),
                f.position_label()
            )
        })
        .collect()
}

/// Markdown overview of the detection results.
pub fn format_findings_overview(findings: &[RiskFinding]) -> String {
    if findings.is_empty() {
        return "There is not any risk in the file.".to_string();
    }

    format_finding_lines(findings).join("\n")
}

/// Categories ordered by number of findings (highest first).
pub fn category_ranking(findings: &[RiskFinding]) -> Vec<(String, usize)> {
    let mut ranking: Vec<(String, usize)> = group_by_category(findings)
        .into_iter()
        .map(|(category, items)| (category, items.len()))
        .collect();

    ranking.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
    ranking
}
