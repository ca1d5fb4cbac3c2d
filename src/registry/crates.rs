use crate::model::Ecosystem;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::http::{endpoint, get_json};
use super::{collect_candidates, RegistryError, MAX_CANDIDATES};

/// Keyword search against the crates.io API.
///
/// crates.io rejects requests without a user agent; the shared client
/// always sends one.
pub struct CratesRegistry {
    client: Client,
    base_url: String,
}

impl CratesRegistry {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[derive(Deserialize)]
struct CratesSearchResponse {
    crates: Vec<CrateHit>,
}

#[derive(Deserialize)]
struct CrateHit {
    id: Option<String>,
}

#[async_trait]
impl super::RegistrySearch for CratesRegistry {
    fn name(&self) -> &'static str {
        "crates.io"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Crates
    }

    async fn query(&self, term: &str) -> Result<Vec<String>, RegistryError> {
        let per_page = MAX_CANDIDATES.to_string();
        let request = self
            .client
            .get(endpoint(&self.base_url, "api/v1/crates"))
            .query(&[("q", term), ("per_page", per_page.as_str())]);

        let response: CratesSearchResponse = get_json(request).await?;
        Ok(collect_candidates(response.crates.into_iter().map(|c| c.id)))
    }
}
