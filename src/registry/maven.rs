use crate::model::Ecosystem;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::http::{endpoint, get_json};
use super::{collect_candidates, RegistryError, MAX_CANDIDATES};

/// Keyword search against Maven Central's Solr endpoint.
///
/// Candidates are `groupId:artifactId` coordinates.
pub struct MavenRegistry {
    client: Client,
    base_url: String,
}

impl MavenRegistry {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[derive(Deserialize)]
struct SolrResponse {
    response: SolrResult,
}

#[derive(Deserialize)]
struct SolrResult {
    docs: Vec<SolrDoc>,
}

#[derive(Deserialize)]
struct SolrDoc {
    id: Option<String>,
}

#[async_trait]
impl super::RegistrySearch for MavenRegistry {
    fn name(&self) -> &'static str {
        "Maven Central"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Maven
    }

    async fn query(&self, term: &str) -> Result<Vec<String>, RegistryError> {
        let rows = MAX_CANDIDATES.to_string();
        let request = self
            .client
            .get(endpoint(&self.base_url, "solrsearch/select"))
            .query(&[("q", term), ("rows", rows.as_str()), ("wt", "json")]);

        let response: SolrResponse = get_json(request).await?;
        Ok(collect_candidates(
            response.response.docs.into_iter().map(|doc| doc.id),
        ))
    }
}
