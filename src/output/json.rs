use crate::model::{Ecosystem, VulnerabilityRecord};
use anyhow::Result;
use chrono::NaiveDateTime;
use serde::Serialize;

use super::markdown::TIMESTAMP_FORMAT;

#[derive(Serialize)]
struct JsonReport<'a> {
    package: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ecosystem: Option<Ecosystem>,
    generated_at: String,
    source: &'static str,
    status: &'static str,
    vulnerability_count: usize,
    vulnerabilities: &'a [VulnerabilityRecord],
}

/// Generate the report as pretty-printed JSON.
pub fn generate_json_string(
    package: &str,
    ecosystem: Option<Ecosystem>,
    vulnerabilities: &[VulnerabilityRecord],
    generated_at: NaiveDateTime,
) -> Result<String> {
    let report = JsonReport {
        package,
        ecosystem,
        generated_at: generated_at.format(TIMESTAMP_FORMAT).to_string(),
        source: "OSV.dev",
        status: if vulnerabilities.is_empty() {
            "safe"
        } else {
            "vulnerable"
        },
        vulnerability_count: vulnerabilities.len(),
        vulnerabilities,
    };

    Ok(serde_json::to_string_pretty(&report)?)
}
