//! Configuration file handling.
//!
//! This module provides loading and saving of osscheck configuration
//! from a TOML file.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/osscheck/config.toml`
//! - macOS: `~/Library/Application Support/osscheck/config.toml`
//! - Windows: `%APPDATA%\osscheck\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! default_ecosystem = "npm"
//! request_timeout_secs = 15
//! report_format = "markdown"
//! report_policy = "when-found"
//! strict_lookup = false
//!
//! [registries]
//! npm = "https://registry.npmjs.org"
//!
//! [ignore]
//! vulnerabilities = ["GHSA-xxxx-*", "CVE-2021-12345"]
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::{Ecosystem, VulnerabilityRecord};
use crate::output::ReportFormat;

/// Decides whether a check writes a report file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ReportPolicy {
    /// Write a report for every check, even when the search found nothing.
    Always,
    /// Write a report only when the registry search returned candidates.
    #[default]
    WhenFound,
}

/// Application configuration.
///
/// # Example
///
/// ```no_run
/// use osscheck::Config;
///
/// let config = Config::load().unwrap();
/// println!("Default ecosystem: {}", config.default_ecosystem);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ecosystem selected at startup when none is given on the command line.
    ///
    /// Default: nuget
    pub default_ecosystem: Ecosystem,

    /// Deadline for each registry or vulnerability database request, in seconds.
    ///
    /// Default: 15
    pub request_timeout_secs: u64,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,

    /// Directory reports are written to. The working directory when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_dir: Option<PathBuf>,

    /// Default: markdown
    pub report_format: ReportFormat,

    /// Default: when-found
    pub report_policy: ReportPolicy,

    /// Skip writing a report when the vulnerability database could not be
    /// reached, instead of reporting the package as safe.
    ///
    /// Default: false
    pub strict_lookup: bool,

    /// Base URL of the OSV.dev API.
    pub osv_url: String,

    /// Base URLs of the package registries.
    pub registries: RegistryEndpoints,

    /// Ignore list configuration for suppressing accepted advisories.
    pub ignore: IgnoreConfig,
}

/// Base URL of each registry API, without a trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryEndpoints {
    pub nuget: String,
    pub npm: String,
    pub pypi: String,
    pub maven: String,
    pub go: String,
    pub crates: String,
    pub rubygems: String,
    pub packagist: String,
    #[serde(rename = "pub")]
    pub pub_dev: String,
}

impl RegistryEndpoints {
    pub fn get(&self, ecosystem: Ecosystem) -> &str {
        match ecosystem {
            Ecosystem::NuGet => &self.nuget,
            Ecosystem::Npm => &self.npm,
            Ecosystem::PyPI => &self.pypi,
            Ecosystem::Maven => &self.maven,
            Ecosystem::Go => &self.go,
            Ecosystem::Crates => &self.crates,
            Ecosystem::RubyGems => &self.rubygems,
            Ecosystem::Packagist => &self.packagist,
            Ecosystem::Pub => &self.pub_dev,
        }
    }

    /// Points every registry at the same base URL. Used with mock servers.
    pub fn all(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        Self {
            nuget: base.clone(),
            npm: base.clone(),
            pypi: base.clone(),
            maven: base.clone(),
            go: base.clone(),
            crates: base.clone(),
            rubygems: base.clone(),
            packagist: base.clone(),
            pub_dev: base,
        }
    }
}

impl Default for RegistryEndpoints {
    fn default() -> Self {
        Self {
            nuget: "https://azuresearch-usnc.nuget.org".to_string(),
            npm: "https://registry.npmjs.org".to_string(),
            pypi: "https://pypi.org".to_string(),
            maven: "https://search.maven.org".to_string(),
            go: "https://proxy.golang.org".to_string(),
            crates: "https://crates.io".to_string(),
            rubygems: "https://rubygems.org".to_string(),
            packagist: "https://packagist.org".to_string(),
            pub_dev: "https://pub.dev".to_string(),
        }
    }
}

/// Configuration for ignoring specific vulnerabilities.
///
/// Use this to suppress known false positives or accepted risks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    /// Advisory or CVE IDs to drop from results (e.g., "CVE-2021-12345",
    /// "GHSA-*"). Supports `*` as a wildcard.
    pub vulnerabilities: Vec<String>,
}

impl IgnoreConfig {
    /// Check if a vulnerability should be ignored, by its own ID or any of
    /// its CVE aliases.
    pub fn should_ignore(&self, record: &VulnerabilityRecord) -> bool {
        std::iter::once(&record.id)
            .chain(record.cve_ids.iter())
            .any(|id| self.matches(id))
    }

    fn matches(&self, id: &str) -> bool {
        self.vulnerabilities.iter().any(|pattern| {
            if pattern.contains('*') {
                glob_match(&pattern.to_ascii_lowercase(), &id.to_ascii_lowercase())
            } else {
                pattern.eq_ignore_ascii_case(id)
            }
        })
    }

    /// Removes ignored records, keeping the order of the rest.
    pub fn filter(&self, records: Vec<VulnerabilityRecord>) -> Vec<VulnerabilityRecord> {
        if self.vulnerabilities.is_empty() {
            return records;
        }
        records.into_iter().filter(|r| !self.should_ignore(r)).collect()
    }
}

/// Simple glob matching (supports * as wildcard).
fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();

    if parts.len() == 1 {
        return pattern == text;
    }

    let mut remaining = text;

    if !parts[0].is_empty() {
        if !remaining.starts_with(parts[0]) {
            return false;
        }
        remaining = &remaining[parts[0].len()..];
    }

    let last_part = parts[parts.len() - 1];
    if !last_part.is_empty() {
        if !remaining.ends_with(last_part) {
            return false;
        }
        remaining = &remaining[..remaining.len() - last_part.len()];
    }

    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        if let Some(pos) = remaining.find(part) {
            remaining = &remaining[pos + part.len()..];
        } else {
            return false;
        }
    }

    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ecosystem: Ecosystem::NuGet,
            request_timeout_secs: 15,
            user_agent: format!("osscheck/{}", env!("CARGO_PKG_VERSION")),
            report_dir: None,
            report_format: ReportFormat::Markdown,
            report_policy: ReportPolicy::WhenFound,
            strict_lookup: false,
            osv_url: "https://api.osv.dev".to_string(),
            registries: RegistryEndpoints::default(),
            ignore: IgnoreConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from an explicit path, falling back to defaults
    /// when the file is absent.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Saves the configuration to the config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    ///
    /// # Example
    ///
    /// ```
    /// use osscheck::Config;
    ///
    /// let path = Config::config_path();
    /// assert!(path.ends_with("osscheck/config.toml"));
    /// ```
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("osscheck")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Directory reports are written to.
    pub fn report_dir(&self) -> PathBuf {
        self.report_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_match_exact() {
        assert!(glob_match("GHSA-abcd", "GHSA-abcd"));
        assert!(!glob_match("GHSA-abcd", "GHSA-efgh"));
    }

    #[test]
    fn test_glob_match_prefix() {
        assert!(glob_match("GHSA-*", "GHSA-1234-5678-9abc"));
        assert!(!glob_match("GHSA-*", "RUSTSEC-2021-0001"));
    }

    #[test]
    fn test_glob_match_middle() {
        assert!(glob_match("CVE-*-1234*", "CVE-2021-12345"));
        assert!(!glob_match("CVE-*-1234*", "CVE-2021-99999"));
    }

    #[test]
    fn test_ignore_matches_cve_alias() {
        let config = IgnoreConfig {
            vulnerabilities: vec!["cve-2021-44228".to_string()],
        };
        let record = VulnerabilityRecord::new("GHSA-jfh8-c2jp-5v3q", "Log4Shell")
            .with_cves(["CVE-2021-44228"]);
        assert!(config.should_ignore(&record));
        assert!(!config.should_ignore(&VulnerabilityRecord::new("GHSA-other", "x")));
    }

    #[test]
    fn test_ignore_glob_is_case_insensitive() {
        let config = IgnoreConfig {
            vulnerabilities: vec!["ghsa-*".to_string()],
        };
        assert!(config.should_ignore(&VulnerabilityRecord::new("GHSA-abcd-efgh-ijkl", "x")));

        let config = IgnoreConfig {
            vulnerabilities: vec!["CVE-2021-*".to_string()],
        };
        let record = VulnerabilityRecord::new("GHSA-1", "x").with_cves(["cve-2021-0001"]);
        assert!(config.should_ignore(&record));
        assert!(!config.should_ignore(&VulnerabilityRecord::new("PYSEC-2021-1", "x")));
    }

    #[test]
    fn test_ignore_filter_keeps_order() {
        let config = IgnoreConfig {
            vulnerabilities: vec!["PYSEC-*".to_string()],
        };
        let records = vec![
            VulnerabilityRecord::new("GHSA-1", "a"),
            VulnerabilityRecord::new("PYSEC-2020-1", "b"),
            VulnerabilityRecord::new("GHSA-2", "c"),
        ];
        let ids: Vec<_> = config.filter(records).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["GHSA-1", "GHSA-2"]);
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.default_ecosystem, Ecosystem::NuGet);
        assert_eq!(config.request_timeout_secs, 15);
        assert_eq!(config.report_format, ReportFormat::Markdown);
        assert_eq!(config.report_policy, ReportPolicy::WhenFound);
        assert!(!config.strict_lookup);
        assert!(config.user_agent.starts_with("osscheck/"));
        assert_eq!(config.registries.get(Ecosystem::Go), "https://proxy.golang.org");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            default_ecosystem = "pypi"
            report_policy = "always"

            [registries]
            npm = "http://localhost:4873"
            "#,
        )
        .unwrap();

        assert_eq!(config.default_ecosystem, Ecosystem::PyPI);
        assert_eq!(config.report_policy, ReportPolicy::Always);
        assert_eq!(config.registries.npm, "http://localhost:4873");
        assert_eq!(config.registries.pub_dev, "https://pub.dev");
        assert_eq!(config.request_timeout_secs, 15);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.default_ecosystem = Ecosystem::Crates;
        config.strict_lookup = true;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.default_ecosystem, Ecosystem::Crates);
        assert!(loaded.strict_lookup);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.default_ecosystem, Ecosystem::NuGet);
    }

    #[test]
    fn test_load_invalid_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "default_ecosystem = \"cobol\"").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
