//! Vulnerability database lookups.
//!
//! [`VulnerabilityChecker`] is the seam between a resolved package and the
//! advisory records rendered into a report. [`OsvChecker`] implements it
//! against the OSV.dev API.

mod osv;

pub use osv::OsvChecker;

use crate::config::Config;
use crate::model::{Ecosystem, VulnerabilityRecord};
use anyhow::Result;
use async_trait::async_trait;

/// Why a vulnerability lookup failed.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("vulnerability database returned HTTP {0}")]
    Status(u16),

    #[error("unexpected response body: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Result of a lookup before it is flattened to a plain record list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// The database answered. An empty list means no known vulnerabilities.
    Findings(Vec<VulnerabilityRecord>),
    /// The database could not be queried.
    Unavailable,
}

impl LookupOutcome {
    pub fn into_records(self) -> Vec<VulnerabilityRecord> {
        match self {
            LookupOutcome::Findings(records) => records,
            LookupOutcome::Unavailable => Vec::new(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, LookupOutcome::Unavailable)
    }
}

#[async_trait]
pub trait VulnerabilityChecker: Send + Sync {
    fn name(&self) -> &'static str;

    /// Looks up advisories for a package, keeping failures distinguishable
    /// from a clean result.
    async fn lookup(&self, package: &str, ecosystem: Ecosystem) -> LookupOutcome;

    /// Looks up advisories for a package. Failures yield an empty list.
    async fn check(&self, package: &str, ecosystem: Ecosystem) -> Vec<VulnerabilityRecord> {
        self.lookup(package, ecosystem).await.into_records()
    }
}

pub fn default_checker(config: &Config) -> Result<OsvChecker> {
    OsvChecker::from_config(config)
}
