use crate::model::Ecosystem;
use async_trait::async_trait;
use reqwest::{Client, Url};

use super::http::probe;
use super::RegistryError;

/// Existence probe against the Go module proxy.
///
/// The proxy only answers for exact module paths: a version list for the
/// module confirms it, and the term is echoed back as the only candidate.
pub struct GoProxy {
    client: Client,
    base_url: String,
}

impl GoProxy {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// `{base}/<escaped module>/@v/list`. Each `/`-separated element of the
    /// module path is encoded as its own segment.
    fn version_list_url(&self, module: &str) -> Result<Url, RegistryError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| RegistryError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        let escaped = escape_module_path(module);
        url.path_segments_mut()
            .map_err(|_| RegistryError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(escaped.split('/'))
            .extend(["@v", "list"]);
        Ok(url)
    }
}

/// Applies the module proxy's case encoding: each uppercase letter becomes
/// `!` followed by its lowercase form.
///
/// ```
/// use osscheck::registry::escape_module_path;
///
/// assert_eq!(
///     escape_module_path("github.com/BurntSushi/toml"),
///     "github.com/!burnt!sushi/toml"
/// );
/// ```
pub fn escape_module_path(module: &str) -> String {
    let mut escaped = String::with_capacity(module.len());
    for c in module.trim_matches('/').chars() {
        if c.is_ascii_uppercase() {
            escaped.push('!');
            escaped.push(c.to_ascii_lowercase());
        } else {
            escaped.push(c);
        }
    }
    escaped
}

#[async_trait]
impl super::RegistrySearch for GoProxy {
    fn name(&self) -> &'static str {
        "Go Module Proxy"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Go
    }

    async fn query(&self, term: &str) -> Result<Vec<String>, RegistryError> {
        let url = self.version_list_url(term)?;

        if probe(self.client.get(url)).await? {
            Ok(vec![term.to_string()])
        } else {
            Ok(Vec::new())
        }
    }
}
