use serde::{Deserialize, Serialize};

/// One advisory entry for a specific package.
///
/// Records come from the vulnerability database and are rendered as-is;
/// nothing downstream of the checker modifies them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnerabilityRecord {
    pub id: String,
    #[serde(default)]
    pub cve_ids: Vec<String>,
    pub summary: String,
    pub details_url: String,
    #[serde(default)]
    pub affected_versions: Vec<String>,
}

impl VulnerabilityRecord {
    pub fn new(id: impl Into<String>, summary: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            details_url: format!("https://osv.dev/vulnerability/{}", id),
            id,
            cve_ids: Vec::new(),
            summary: summary.into(),
            affected_versions: Vec::new(),
        }
    }

    pub fn with_cves<I, S>(mut self, cves: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cve_ids = cves.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_versions<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.affected_versions = versions.into_iter().map(Into::into).collect();
        self
    }
}
