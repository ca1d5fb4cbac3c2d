//! Report rendering, persistence, and console output.

mod cli;
mod json;
mod markdown;
mod writer;

pub use cli::{compact_versions, print_candidates, print_ecosystems, print_findings};
pub use json::generate_json_string;
pub use markdown::{
    escape_cell, generate_markdown_string, truncate_summary, wrap_versions, SUMMARY_KEPT_CHARS,
    SUMMARY_MAX_CHARS, WRAP_WIDTH,
};
pub use writer::{report_file_name, ReportWriter};

use crate::model::{Ecosystem, VulnerabilityRecord};
use anyhow::Result;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// File format of a written report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Markdown document with a summary table and per-advisory details
    #[default]
    #[serde(alias = "md")]
    #[value(alias = "md")]
    Markdown,
    /// JSON document for programmatic use
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Markdown => "md",
            ReportFormat::Json => "json",
        }
    }
}

/// Render a report in the given format.
pub fn render_report(
    format: ReportFormat,
    package: &str,
    ecosystem: Option<Ecosystem>,
    vulnerabilities: &[VulnerabilityRecord],
    generated_at: NaiveDateTime,
) -> Result<String> {
    match format {
        ReportFormat::Markdown => Ok(generate_markdown_string(
            package,
            ecosystem,
            vulnerabilities,
            generated_at,
        )),
        ReportFormat::Json => generate_json_string(package, ecosystem, vulnerabilities, generated_at),
    }
}
