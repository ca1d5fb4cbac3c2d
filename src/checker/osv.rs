use crate::config::Config;
use crate::model::{Ecosystem, VulnerabilityRecord};
use crate::registry::build_client;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{LookupError, LookupOutcome};

/// Upper bound on result pages followed for a single package.
const MAX_PAGES: usize = 10;

pub struct OsvChecker {
    client: Client,
    base_url: String,
}

impl OsvChecker {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = build_client(&config.user_agent, config.request_timeout())?;
        Ok(Self::new(client, config.osv_url.clone()))
    }

    fn query_url(&self) -> String {
        format!("{}/v1/query", self.base_url.trim_end_matches('/'))
    }

    /// Queries OSV.dev for every advisory affecting a package, following
    /// page tokens.
    async fn query_all(&self, package: &str, ecosystem: Ecosystem) -> Result<Vec<OsvVuln>, LookupError> {
        let mut vulns = Vec::new();
        let mut page_token = None;

        for _ in 0..MAX_PAGES {
            let query = OsvQuery {
                package: OsvPackage {
                    name: package.to_string(),
                    ecosystem: ecosystem.osv_name().to_string(),
                },
                page_token: page_token.take(),
            };

            let response = self.client.post(self.query_url()).json(&query).send().await?;

            let status = response.status();
            if !status.is_success() {
                return Err(LookupError::Status(status.as_u16()));
            }

            let body = response.bytes().await?;
            let page: OsvQueryResponse = serde_json::from_slice(&body)?;
            vulns.extend(page.vulns);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(vulns)
    }
}

#[derive(Serialize)]
struct OsvQuery {
    package: OsvPackage,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<String>,
}

#[derive(Serialize)]
struct OsvPackage {
    name: String,
    ecosystem: String,
}

#[derive(Deserialize)]
struct OsvQueryResponse {
    #[serde(default)]
    vulns: Vec<OsvVuln>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct OsvVuln {
    id: String,
    summary: Option<String>,
    details: Option<String>,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    affected: Vec<OsvAffected>,
}

#[derive(Deserialize)]
struct OsvAffected {
    package: Option<OsvAffectedPackage>,
    #[serde(default)]
    versions: Vec<String>,
}

#[derive(Deserialize)]
struct OsvAffectedPackage {
    name: Option<String>,
}

#[async_trait]
impl super::VulnerabilityChecker for OsvChecker {
    fn name(&self) -> &'static str {
        "OSV.dev"
    }

    async fn lookup(&self, package: &str, ecosystem: Ecosystem) -> LookupOutcome {
        match self.query_all(package, ecosystem).await {
            Ok(vulns) => {
                debug!(package, %ecosystem, count = vulns.len(), "OSV lookup finished");
                LookupOutcome::Findings(
                    vulns
                        .into_iter()
                        .map(|vuln| to_record(vuln, package))
                        .collect(),
                )
            }
            Err(err) => {
                warn!(package, %ecosystem, error = %err, "OSV lookup failed");
                LookupOutcome::Unavailable
            }
        }
    }
}

fn to_record(vuln: OsvVuln, package: &str) -> VulnerabilityRecord {
    let cve_ids = cve_ids(&vuln);
    let summary = summary_of(&vuln);
    let affected_versions = affected_versions(&vuln, package);

    VulnerabilityRecord::new(vuln.id, summary)
        .with_cves(cve_ids)
        .with_versions(affected_versions)
}

/// CVE identifiers among the advisory's own ID and its aliases.
fn cve_ids(vuln: &OsvVuln) -> Vec<String> {
    let mut cves: Vec<String> = Vec::new();
    for id in std::iter::once(&vuln.id).chain(vuln.aliases.iter()) {
        if id.starts_with("CVE-") && !cves.contains(id) {
            cves.push(id.clone());
        }
    }
    cves
}

fn summary_of(vuln: &OsvVuln) -> String {
    vuln.summary
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            vuln.details
                .as_deref()
                .and_then(|d| d.lines().map(str::trim).find(|line| !line.is_empty()))
        })
        .unwrap_or("No summary available")
        .to_string()
}

/// Versions listed for the queried package, in first-seen order.
///
/// Falls back to every affected entry when none names the package.
fn affected_versions(vuln: &OsvVuln, package: &str) -> Vec<String> {
    let matching: Vec<&OsvAffected> = vuln
        .affected
        .iter()
        .filter(|a| match a.package.as_ref().and_then(|p| p.name.as_deref()) {
            Some(name) => names_match(name, package),
            None => true,
        })
        .collect();

    let entries: Vec<&OsvAffected> = if matching.is_empty() {
        vuln.affected.iter().collect()
    } else {
        matching
    };

    let mut versions: Vec<String> = Vec::new();
    for version in entries.iter().flat_map(|a| a.versions.iter()) {
        if !versions.contains(version) {
            versions.push(version.clone());
        }
    }
    versions
}

/// Compares package names ignoring case and `-`/`_`/`.` differences.
fn names_match(a: &str, b: &str) -> bool {
    fn normalize(name: &str) -> String {
        name.chars()
            .map(|c| match c {
                '_' | '.' => '-',
                c => c.to_ascii_lowercase(),
            })
            .collect()
    }
    normalize(a) == normalize(b)
}
