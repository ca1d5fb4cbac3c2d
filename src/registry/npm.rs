use crate::model::Ecosystem;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::http::{endpoint, get_json};
use super::{collect_candidates, RegistryError, MAX_CANDIDATES};

/// Full-text search against the npm registry.
pub struct NpmRegistry {
    client: Client,
    base_url: String,
}

impl NpmRegistry {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[derive(Deserialize)]
struct NpmSearchResponse {
    objects: Vec<NpmSearchObject>,
}

#[derive(Deserialize)]
struct NpmSearchObject {
    package: Option<NpmPackage>,
}

#[derive(Deserialize)]
struct NpmPackage {
    name: Option<String>,
}

#[async_trait]
impl super::RegistrySearch for NpmRegistry {
    fn name(&self) -> &'static str {
        "npm"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Npm
    }

    async fn query(&self, term: &str) -> Result<Vec<String>, RegistryError> {
        let size = MAX_CANDIDATES.to_string();
        let request = self
            .client
            .get(endpoint(&self.base_url, "-/v1/search"))
            .query(&[("text", term), ("size", size.as_str())]);

        let response: NpmSearchResponse = get_json(request).await?;
        Ok(collect_candidates(
            response
                .objects
                .into_iter()
                .map(|obj| obj.package.and_then(|pkg| pkg.name)),
        ))
    }
}
