use crate::model::Ecosystem;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::http::{endpoint, get_json};
use super::{collect_candidates, RegistryError, MAX_CANDIDATES};

/// Keyword search against Packagist. Candidates are `vendor/package` names.
pub struct PackagistRegistry {
    client: Client,
    base_url: String,
}

impl PackagistRegistry {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[derive(Deserialize)]
struct PackagistSearchResponse {
    results: Vec<PackagistHit>,
}

#[derive(Deserialize)]
struct PackagistHit {
    name: Option<String>,
}

#[async_trait]
impl super::RegistrySearch for PackagistRegistry {
    fn name(&self) -> &'static str {
        "Packagist"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Packagist
    }

    async fn query(&self, term: &str) -> Result<Vec<String>, RegistryError> {
        let per_page = MAX_CANDIDATES.to_string();
        let request = self
            .client
            .get(endpoint(&self.base_url, "search.json"))
            .query(&[("q", term), ("per_page", per_page.as_str())]);

        let response: PackagistSearchResponse = get_json(request).await?;
        Ok(collect_candidates(
            response.results.into_iter().map(|hit| hit.name),
        ))
    }
}
