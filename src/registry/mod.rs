//! Package registry search adapters.
//!
//! This module provides the [`RegistrySearch`] trait, one implementation per
//! supported registry, and the [`SearchDispatcher`] that routes a search term
//! to the adapter for an ecosystem.
//!
//! # Available Registries
//!
//! | Adapter | Ecosystem | Query style |
//! |---------|-----------|-------------|
//! | [`NuGetRegistry`] | NuGet | Search API, stable releases only |
//! | [`NpmRegistry`] | npm | Full-text search |
//! | [`PyPiRegistry`] | PyPI | Exact-name existence probe |
//! | [`MavenRegistry`] | Maven | Solr keyword search |
//! | [`GoProxy`] | Go | Module proxy existence probe |
//! | [`CratesRegistry`] | crates.io | Keyword search |
//! | [`RubyGemsRegistry`] | RubyGems | Keyword search |
//! | [`PackagistRegistry`] | Packagist | Keyword search |
//! | [`PubRegistry`] | Pub | Keyword search |
//!
//! Searches never fail from the caller's point of view. Transport errors,
//! error statuses and unexpected bodies are logged and come back as an
//! empty candidate list, the same as a search with no hits.
//!
//! # Example
//!
//! ```no_run
//! use osscheck::{Config, registry::SearchDispatcher};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let dispatcher = SearchDispatcher::new(&Config::default())?;
//!     for name in dispatcher.dispatch("serde", "crates").await {
//!         println!("{}", name);
//!     }
//!     Ok(())
//! }
//! ```

mod crates;
mod go;
mod http;
mod maven;
mod npm;
mod nuget;
mod packagist;
mod pub_dev;
mod pypi;
mod rubygems;

pub use crates::CratesRegistry;
pub use go::{escape_module_path, GoProxy};
pub use http::build_client;
pub use maven::MavenRegistry;
pub use npm::NpmRegistry;
pub use nuget::NuGetRegistry;
pub use packagist::PackagistRegistry;
pub use pub_dev::PubRegistry;
pub use pypi::PyPiRegistry;
pub use rubygems::RubyGemsRegistry;

use crate::config::{Config, RegistryEndpoints};
use crate::model::Ecosystem;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Most candidates any registry search returns.
pub const MAX_CANDIDATES: usize = 5;

/// Why a registry request did not produce candidates.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("registry returned HTTP {0}")]
    Status(u16),

    #[error("unexpected response body: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid registry URL {0}")]
    InvalidUrl(String),
}

/// Result of a registry search before it is flattened to a plain list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The registry answered. The list may be empty.
    Found(Vec<String>),
    /// The registry could not be reached or answered with an error status.
    Unreachable,
    /// The registry answered with a body that could not be read.
    Malformed,
    /// No adapter is registered for the requested ecosystem.
    NoAdapter,
}

impl SearchOutcome {
    /// Projects the outcome to the public candidate list.
    pub fn into_candidates(self) -> Vec<String> {
        match self {
            SearchOutcome::Found(candidates) => candidates,
            _ => Vec::new(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SearchOutcome::Unreachable | SearchOutcome::Malformed)
    }
}

impl From<&RegistryError> for SearchOutcome {
    fn from(err: &RegistryError) -> Self {
        match err {
            RegistryError::Malformed(_) => SearchOutcome::Malformed,
            RegistryError::Transport(e) if e.is_decode() => SearchOutcome::Malformed,
            _ => SearchOutcome::Unreachable,
        }
    }
}

/// A search strategy for one package registry.
///
/// Implementors translate a free-text term into the registry's native query
/// and extract up to [`MAX_CANDIDATES`] package identifiers, in the order the
/// registry ranked them.
#[async_trait]
pub trait RegistrySearch: Send + Sync {
    /// Returns the human-readable name of the registry.
    fn name(&self) -> &'static str;

    /// Returns the ecosystem this adapter serves.
    fn ecosystem(&self) -> Ecosystem;

    /// Queries the registry.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, or a
    /// response body of the wrong shape.
    async fn query(&self, term: &str) -> Result<Vec<String>, RegistryError>;

    /// Queries the registry and logs any failure instead of returning it.
    async fn search_outcome(&self, term: &str) -> SearchOutcome {
        match self.query(term).await {
            Ok(candidates) => {
                debug!(
                    registry = self.name(),
                    count = candidates.len(),
                    "registry search finished"
                );
                SearchOutcome::Found(candidates)
            }
            Err(err) => {
                warn!(registry = self.name(), term, error = %err, "registry search failed");
                SearchOutcome::from(&err)
            }
        }
    }

    /// Searches the registry. An empty list means no match or a failed request.
    async fn search(&self, term: &str) -> Vec<String> {
        self.search_outcome(term).await.into_candidates()
    }
}

/// Reads identifiers from the first [`MAX_CANDIDATES`] hits, skipping hits
/// without one.
///
/// Duplicates are kept as the registry ranked them.
pub(crate) fn collect_candidates<I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    names
        .into_iter()
        .take(MAX_CANDIDATES)
        .flatten()
        .filter(|name| !name.is_empty())
        .collect()
}

/// Returns adapters for every supported registry.
///
/// # Example
///
/// ```
/// use osscheck::config::RegistryEndpoints;
/// use osscheck::registry::all_registries;
///
/// let registries = all_registries(&reqwest::Client::new(), &RegistryEndpoints::default());
/// assert_eq!(registries.len(), 9);
/// ```
pub fn all_registries(client: &Client, endpoints: &RegistryEndpoints) -> Vec<Box<dyn RegistrySearch>> {
    Ecosystem::ALL
        .iter()
        .map(|&ecosystem| get_registry(ecosystem, client, endpoints))
        .collect()
}

/// Returns the adapter for a specific ecosystem.
pub fn get_registry(
    ecosystem: Ecosystem,
    client: &Client,
    endpoints: &RegistryEndpoints,
) -> Box<dyn RegistrySearch> {
    let client = client.clone();
    let base_url = endpoints.get(ecosystem).to_string();
    match ecosystem {
        Ecosystem::NuGet => Box::new(NuGetRegistry::new(client, base_url)),
        Ecosystem::Npm => Box::new(NpmRegistry::new(client, base_url)),
        Ecosystem::PyPI => Box::new(PyPiRegistry::new(client, base_url)),
        Ecosystem::Maven => Box::new(MavenRegistry::new(client, base_url)),
        Ecosystem::Go => Box::new(GoProxy::new(client, base_url)),
        Ecosystem::Crates => Box::new(CratesRegistry::new(client, base_url)),
        Ecosystem::RubyGems => Box::new(RubyGemsRegistry::new(client, base_url)),
        Ecosystem::Packagist => Box::new(PackagistRegistry::new(client, base_url)),
        Ecosystem::Pub => Box::new(PubRegistry::new(client, base_url)),
    }
}

/// Routes search terms to the adapter registered for an ecosystem.
pub struct SearchDispatcher {
    adapters: HashMap<Ecosystem, Box<dyn RegistrySearch>>,
}

impl SearchDispatcher {
    /// Builds a dispatcher with every registry, using the configured
    /// endpoints, user agent and request timeout.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = build_client(&config.user_agent, config.request_timeout())?;
        Ok(Self::with_client(&client, &config.registries))
    }

    pub fn with_client(client: &Client, endpoints: &RegistryEndpoints) -> Self {
        let mut dispatcher = Self::empty();
        for adapter in all_registries(client, endpoints) {
            dispatcher.register(adapter);
        }
        dispatcher
    }

    /// A dispatcher with no adapters registered.
    pub fn empty() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Registers an adapter for its ecosystem, returning the one it replaced.
    pub fn register(&mut self, adapter: Box<dyn RegistrySearch>) -> Option<Box<dyn RegistrySearch>> {
        self.adapters.insert(adapter.ecosystem(), adapter)
    }

    pub fn get(&self, ecosystem: Ecosystem) -> Option<&dyn RegistrySearch> {
        self.adapters.get(&ecosystem).map(|adapter| adapter.as_ref())
    }

    /// Registered ecosystems, in menu order.
    pub fn ecosystems(&self) -> Vec<Ecosystem> {
        Ecosystem::ALL
            .into_iter()
            .filter(|e| self.adapters.contains_key(e))
            .collect()
    }

    /// Searches the registry named by `key`, matched case-insensitively.
    ///
    /// Unknown keys return an empty list without touching the network.
    pub async fn dispatch(&self, term: &str, key: &str) -> Vec<String> {
        self.dispatch_outcome(term, key).await.into_candidates()
    }

    pub async fn dispatch_outcome(&self, term: &str, key: &str) -> SearchOutcome {
        match Ecosystem::parse(key) {
            Some(ecosystem) => self.search_outcome(term, ecosystem).await,
            None => {
                debug!(key, "no registry adapter for ecosystem key");
                SearchOutcome::NoAdapter
            }
        }
    }

    pub async fn search(&self, term: &str, ecosystem: Ecosystem) -> Vec<String> {
        self.search_outcome(term, ecosystem).await.into_candidates()
    }

    pub async fn search_outcome(&self, term: &str, ecosystem: Ecosystem) -> SearchOutcome {
        let Some(adapter) = self.get(ecosystem) else {
            return SearchOutcome::NoAdapter;
        };

        if term.trim().is_empty() {
            return SearchOutcome::Found(Vec::new());
        }

        adapter.search_outcome(term).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRegistry {
        ecosystem: Ecosystem,
        result: fn() -> Result<Vec<String>, RegistryError>,
    }

    #[async_trait]
    impl RegistrySearch for FixedRegistry {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn ecosystem(&self) -> Ecosystem {
            self.ecosystem
        }

        async fn query(&self, _term: &str) -> Result<Vec<String>, RegistryError> {
            (self.result)()
        }
    }

    fn names() -> Result<Vec<String>, RegistryError> {
        Ok(vec!["alpha".to_string(), "beta".to_string()])
    }

    fn bad_status() -> Result<Vec<String>, RegistryError> {
        Err(RegistryError::Status(503))
    }

    fn bad_body() -> Result<Vec<String>, RegistryError> {
        Err(serde_json::from_str::<u8>("nope").unwrap_err().into())
    }

    #[test]
    fn test_collect_candidates_caps_and_skips_empty() {
        let names = vec![
            Some("a".to_string()),
            None,
            Some(String::new()),
            Some("b".to_string()),
            Some("c".to_string()),
            Some("d".to_string()),
        ];
        assert_eq!(collect_candidates(names), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_collect_candidates_counts_unnamed_hits() {
        let names = ["a", "", "b", "c", "d", "e", "f"]
            .iter()
            .map(|n| Some(n.to_string()))
            .collect::<Vec<_>>();
        assert_eq!(collect_candidates(names), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_collect_candidates_keeps_duplicates() {
        let names = ["a", "a", "b"].iter().map(|n| Some(n.to_string()));
        assert_eq!(collect_candidates(names), vec!["a", "a", "b"]);
    }

    #[test]
    fn test_outcome_projection() {
        assert_eq!(
            SearchOutcome::Found(vec!["x".to_string()]).into_candidates(),
            vec!["x"]
        );
        assert!(SearchOutcome::Unreachable.into_candidates().is_empty());
        assert!(SearchOutcome::Malformed.into_candidates().is_empty());
        assert!(SearchOutcome::NoAdapter.into_candidates().is_empty());
        assert!(SearchOutcome::Unreachable.is_failure());
        assert!(!SearchOutcome::NoAdapter.is_failure());
    }

    #[tokio::test]
    async fn test_dispatch_is_case_insensitive() {
        let mut dispatcher = SearchDispatcher::empty();
        dispatcher.register(Box::new(FixedRegistry {
            ecosystem: Ecosystem::Npm,
            result: names,
        }));

        assert_eq!(dispatcher.dispatch("x", "NPM").await, vec!["alpha", "beta"]);
        assert_eq!(dispatcher.dispatch("x", "npm").await, vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_key_is_empty() {
        let dispatcher = SearchDispatcher::empty();
        assert!(dispatcher.dispatch("x", "cpan").await.is_empty());
        assert_eq!(
            dispatcher.dispatch_outcome("x", "cpan").await,
            SearchOutcome::NoAdapter
        );
    }

    #[tokio::test]
    async fn test_dispatch_unregistered_ecosystem_is_empty() {
        let dispatcher = SearchDispatcher::empty();
        assert_eq!(
            dispatcher.dispatch_outcome("x", "npm").await,
            SearchOutcome::NoAdapter
        );
    }

    #[tokio::test]
    async fn test_failures_degrade_to_empty() {
        let mut dispatcher = SearchDispatcher::empty();
        dispatcher.register(Box::new(FixedRegistry {
            ecosystem: Ecosystem::Maven,
            result: bad_status,
        }));
        dispatcher.register(Box::new(FixedRegistry {
            ecosystem: Ecosystem::Pub,
            result: bad_body,
        }));

        assert_eq!(
            dispatcher.search_outcome("x", Ecosystem::Maven).await,
            SearchOutcome::Unreachable
        );
        assert_eq!(
            dispatcher.search_outcome("x", Ecosystem::Pub).await,
            SearchOutcome::Malformed
        );
        assert!(dispatcher.dispatch("x", "maven").await.is_empty());
        assert!(dispatcher.dispatch("x", "pub").await.is_empty());
    }

    #[tokio::test]
    async fn test_blank_term_skips_adapter() {
        let mut dispatcher = SearchDispatcher::empty();
        dispatcher.register(Box::new(FixedRegistry {
            ecosystem: Ecosystem::Npm,
            result: names,
        }));
        assert!(dispatcher.dispatch("   ", "npm").await.is_empty());
    }

    #[test]
    fn test_register_replaces_adapter() {
        let mut dispatcher = SearchDispatcher::empty();
        let first = dispatcher.register(Box::new(FixedRegistry {
            ecosystem: Ecosystem::Go,
            result: names,
        }));
        let second = dispatcher.register(Box::new(FixedRegistry {
            ecosystem: Ecosystem::Go,
            result: bad_status,
        }));
        assert!(first.is_none());
        assert!(second.is_some());
        assert_eq!(dispatcher.ecosystems(), vec![Ecosystem::Go]);
    }

    #[test]
    fn test_with_client_registers_every_ecosystem() {
        let dispatcher =
            SearchDispatcher::with_client(&Client::new(), &RegistryEndpoints::default());
        assert_eq!(dispatcher.ecosystems(), Ecosystem::ALL.to_vec());
        for ecosystem in Ecosystem::ALL {
            let adapter = dispatcher.get(ecosystem).unwrap();
            assert_eq!(adapter.ecosystem(), ecosystem);
        }
    }
}
