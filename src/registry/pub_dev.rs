use crate::model::Ecosystem;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::http::{endpoint, get_json};
use super::{collect_candidates, RegistryError};

/// Keyword search against pub.dev.
pub struct PubRegistry {
    client: Client,
    base_url: String,
}

impl PubRegistry {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[derive(Deserialize)]
struct PubSearchResponse {
    packages: Vec<PubHit>,
}

#[derive(Deserialize)]
struct PubHit {
    package: Option<String>,
}

#[async_trait]
impl super::RegistrySearch for PubRegistry {
    fn name(&self) -> &'static str {
        "Pub"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Pub
    }

    async fn query(&self, term: &str) -> Result<Vec<String>, RegistryError> {
        let request = self
            .client
            .get(endpoint(&self.base_url, "api/search"))
            .query(&[("q", term)]);

        let response: PubSearchResponse = get_json(request).await?;
        Ok(collect_candidates(
            response.packages.into_iter().map(|hit| hit.package),
        ))
    }
}
