use crate::model::Ecosystem;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::http::{endpoint, get_json};
use super::{collect_candidates, RegistryError};

/// Keyword search against rubygems.org.
///
/// The API has no page size parameter, so results are cut down locally.
pub struct RubyGemsRegistry {
    client: Client,
    base_url: String,
}

impl RubyGemsRegistry {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[derive(Deserialize)]
struct Gem {
    name: Option<String>,
}

#[async_trait]
impl super::RegistrySearch for RubyGemsRegistry {
    fn name(&self) -> &'static str {
        "RubyGems"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::RubyGems
    }

    async fn query(&self, term: &str) -> Result<Vec<String>, RegistryError> {
        let request = self
            .client
            .get(endpoint(&self.base_url, "api/v1/search.json"))
            .query(&[("query", term)]);

        let gems: Vec<Gem> = get_json(request).await?;
        Ok(collect_candidates(gems.into_iter().map(|gem| gem.name)))
    }
}
