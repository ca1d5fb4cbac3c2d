use crate::model::Ecosystem;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::http::{endpoint, get_json};
use super::{collect_candidates, RegistryError, MAX_CANDIDATES};

/// Searches the NuGet gallery through its search query service.
///
/// Prerelease versions are excluded, matching what `dotnet add package`
/// would resolve by default.
pub struct NuGetRegistry {
    client: Client,
    base_url: String,
}

impl NuGetRegistry {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[derive(Deserialize)]
struct NuGetSearchResponse {
    data: Vec<NuGetPackage>,
}

#[derive(Deserialize)]
struct NuGetPackage {
    id: Option<String>,
}

#[async_trait]
impl super::RegistrySearch for NuGetRegistry {
    fn name(&self) -> &'static str {
        "NuGet"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::NuGet
    }

    async fn query(&self, term: &str) -> Result<Vec<String>, RegistryError> {
        let take = MAX_CANDIDATES.to_string();
        let request = self
            .client
            .get(endpoint(&self.base_url, "query"))
            .query(&[
                ("q", term),
                ("skip", "0"),
                ("take", take.as_str()),
                ("prerelease", "false"),
            ]);

        let response: NuGetSearchResponse = get_json(request).await?;
        Ok(collect_candidates(response.data.into_iter().map(|p| p.id)))
    }
}
