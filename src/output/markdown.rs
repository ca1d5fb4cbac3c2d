//! Markdown vulnerability report.
//!
//! The document is a pure function of its inputs: the same package,
//! ecosystem, records and timestamp always render byte-identical text, so
//! reports can be diffed between runs.

use crate::model::{Ecosystem, VulnerabilityRecord};
use chrono::NaiveDateTime;

/// Summaries longer than this are truncated in the summary table.
pub const SUMMARY_MAX_CHARS: usize = 60;

/// Characters kept from a truncated summary, before the `...` marker.
pub const SUMMARY_KEPT_CHARS: usize = 57;

/// Line width of the affected-versions block.
pub const WRAP_WIDTH: usize = 80;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Generate the Markdown report as a string.
pub fn generate_markdown_string(
    package: &str,
    ecosystem: Option<Ecosystem>,
    vulnerabilities: &[VulnerabilityRecord],
    generated_at: NaiveDateTime,
) -> String {
    let mut doc = String::new();

    line(&mut doc, &format!("# OSS Vulnerability Report: {}", package));
    line(
        &mut doc,
        &format!("**Generated on:** {}", generated_at.format(TIMESTAMP_FORMAT)),
    );
    if let Some(ecosystem) = ecosystem {
        line(&mut doc, &format!("**Ecosystem:** {}", ecosystem.display_name()));
    }
    line(&mut doc, "**Source:** [OSV.dev](https://osv.dev)");
    line(&mut doc, "");

    if vulnerabilities.is_empty() {
        line(&mut doc, "## Status: SAFE");
        line(&mut doc, "No vulnerabilities found in the checked versions.");
        return doc;
    }

    line(
        &mut doc,
        &format!("Found {} vulnerability records.", vulnerabilities.len()),
    );
    line(&mut doc, "");

    push_summary_table(&mut doc, vulnerabilities);

    line(&mut doc, "## Detailed Findings");
    line(&mut doc, "");

    for vuln in vulnerabilities {
        push_details(&mut doc, vuln);
    }

    doc
}

fn push_summary_table(doc: &mut String, vulnerabilities: &[VulnerabilityRecord]) {
    line(doc, "## Summary Table");
    line(doc, "");
    line(doc, "| ID | CVE | Summary | URL |");
    line(doc, "|---|---|---|---|");

    for vuln in vulnerabilities {
        let cve = if vuln.cve_ids.is_empty() {
            "-".to_string()
        } else {
            vuln.cve_ids.join(", ")
        };

        line(
            doc,
            &format!(
                "| {} | {} | {} | [Link]({}) |",
                escape_cell(&vuln.id),
                escape_cell(&cve),
                escape_cell(&truncate_summary(&vuln.summary)),
                vuln.details_url.replace('|', "%7C"),
            ),
        );
    }

    line(doc, "");
}

fn push_details(doc: &mut String, vuln: &VulnerabilityRecord) {
    line(doc, &format!("### {}", vuln.id));
    line(doc, &format!("**Summary:** {}", vuln.summary));
    line(doc, "");

    if !vuln.cve_ids.is_empty() {
        line(doc, &format!("**CVE:** {}", vuln.cve_ids.join(", ")));
        line(doc, "");
    }

    line(doc, &format!("**URL:** {}", vuln.details_url));
    line(doc, "");
    line(doc, "**Affected Versions:**");

    if vuln.affected_versions.is_empty() {
        line(doc, "_No specific versions listed in affected range._");
    } else {
        line(doc, "```");
        for wrapped in wrap_versions(&vuln.affected_versions.join(", "), WRAP_WIDTH) {
            line(doc, &wrapped);
        }
        line(doc, "```");
    }

    line(doc, "");
    line(doc, "---");
    line(doc, "");
}

fn line(doc: &mut String, text: &str) {
    doc.push_str(text);
    doc.push('\n');
}

/// Shortens a summary for the table: anything over
/// [`SUMMARY_MAX_CHARS`] becomes its first [`SUMMARY_KEPT_CHARS`]
/// characters followed by `...`.
pub fn truncate_summary(summary: &str) -> String {
    if summary.chars().count() > SUMMARY_MAX_CHARS {
        let kept: String = summary.chars().take(SUMMARY_KEPT_CHARS).collect();
        format!("{}...", kept)
    } else {
        summary.to_string()
    }
}

/// Makes a value safe to place in a table cell: pipes are escaped and line
/// breaks become spaces.
pub fn escape_cell(value: &str) -> String {
    value
        .replace("\r\n", " ")
        .replace(|c: char| c == '\r' || c == '\n', " ")
        .replace('|', "\\|")
}

/// Hard-wraps a comma-separated list to `width` characters without splitting
/// entries.
///
/// When text remains past the window, the line breaks after the last comma
/// inside the window, keeping the comma. A line is cut mid-entry only when
/// the window holds no comma. Lines are trimmed and empty lines dropped.
///
/// ```
/// use osscheck::output::wrap_versions;
///
/// let lines = wrap_versions("1.0.0, 1.0.1, 1.0.2", 14);
/// assert_eq!(lines, vec!["1.0.0, 1.0.1,", "1.0.2"]);
/// ```
pub fn wrap_versions(joined: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = joined.chars().collect();
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let mut len = width.min(chars.len() - start);

        if start + len < chars.len() {
            let window = &chars[start..start + len];
            if let Some(comma) = window.iter().rposition(|&c| c == ',') {
                if comma > 0 {
                    len = comma + 1;
                }
            }
        }

        let segment: String = chars[start..start + len].iter().collect();
        let trimmed = segment.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
        start += len;
    }

    lines
}
