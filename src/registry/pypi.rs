use crate::model::Ecosystem;
use async_trait::async_trait;
use reqwest::{Client, Url};

use super::http::probe;
use super::RegistryError;

/// Existence probe against the PyPI JSON API.
///
/// PyPI has no search API, so the term is looked up as an exact project
/// name. A hit echoes the term back as the only candidate.
pub struct PyPiRegistry {
    client: Client,
    base_url: String,
}

impl PyPiRegistry {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// `{base}/pypi/<name>/json`, with the name encoded as one path segment.
    fn project_url(&self, name: &str) -> Result<Url, RegistryError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| RegistryError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| RegistryError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["pypi", name, "json"]);
        Ok(url)
    }
}

#[async_trait]
impl super::RegistrySearch for PyPiRegistry {
    fn name(&self) -> &'static str {
        "PyPI"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::PyPI
    }

    async fn query(&self, term: &str) -> Result<Vec<String>, RegistryError> {
        let url = self.project_url(term)?;

        if probe(self.client.get(url)).await? {
            Ok(vec![term.to_string()])
        } else {
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(base_url: &str) -> PyPiRegistry {
        PyPiRegistry::new(Client::new(), base_url)
    }

    #[test]
    fn test_project_url() {
        let url = registry("https://pypi.org").project_url("Django").unwrap();
        assert_eq!(url.as_str(), "https://pypi.org/pypi/Django/json");
    }

    #[test]
    fn test_project_url_encodes_segment() {
        let url = registry("https://pypi.org/").project_url("a b/c").unwrap();
        assert_eq!(url.as_str(), "https://pypi.org/pypi/a%20b%2Fc/json");
    }

    #[test]
    fn test_project_url_rejects_bad_base() {
        assert!(matches!(
            registry("not a url").project_url("x"),
            Err(RegistryError::InvalidUrl(_))
        ));
    }
}
