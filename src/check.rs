//! One package check: registry search, target selection, vulnerability
//! lookup, and report output.
//!
//! The steps are exposed separately so the interactive menu can ask the
//! user to pick a candidate between the search and the lookup.

use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use std::path::PathBuf;

use crate::checker::{default_checker, LookupOutcome, VulnerabilityChecker};
use crate::config::{Config, IgnoreConfig, ReportPolicy};
use crate::model::{Ecosystem, VulnerabilityRecord};
use crate::output::{render_report, ReportWriter};
use crate::registry::{SearchDispatcher, SearchOutcome};

/// Everything learned during one check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Package identifier the vulnerability lookup ran for.
    pub target: String,
    pub ecosystem: Ecosystem,
    /// Registry search outcome, or `None` when the search was skipped.
    pub search: Option<SearchOutcome>,
    /// Lookup outcome with ignored advisories removed.
    pub lookup: LookupOutcome,
    pub generated_at: NaiveDateTime,
}

impl CheckResult {
    pub fn candidates(&self) -> &[String] {
        match &self.search {
            Some(SearchOutcome::Found(candidates)) => candidates,
            _ => &[],
        }
    }

    pub fn vulnerabilities(&self) -> &[VulnerabilityRecord] {
        match &self.lookup {
            LookupOutcome::Findings(records) => records,
            LookupOutcome::Unavailable => &[],
        }
    }

    /// True when the search found candidates or was deliberately skipped.
    pub fn package_resolved(&self) -> bool {
        self.search.is_none() || !self.candidates().is_empty()
    }
}

/// Whether a check should produce a report file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportDecision {
    Write,
    /// The registry search returned nothing and the policy requires a hit.
    SkipNoCandidates,
    /// The vulnerability database was unavailable and strict lookups are on.
    SkipLookupUnavailable,
}

/// Picks the package to check from the user's answer to the candidate list.
///
/// An empty answer takes the first candidate, a number in `1..=n` takes that
/// candidate, and anything else is used as a package name. Without
/// candidates the original input is used.
pub fn select_target(input: &str, candidates: &[String], selection: &str) -> String {
    let selection = selection.trim();

    let Some(first) = candidates.first() else {
        return input.to_string();
    };

    if selection.is_empty() {
        return first.clone();
    }

    match selection.parse::<usize>() {
        Ok(index) if (1..=candidates.len()).contains(&index) => candidates[index - 1].clone(),
        _ => selection.to_string(),
    }
}

pub struct CheckRunner {
    dispatcher: SearchDispatcher,
    checker: Box<dyn VulnerabilityChecker>,
    writer: ReportWriter,
    ignore: IgnoreConfig,
    policy: ReportPolicy,
    strict_lookup: bool,
}

impl CheckRunner {
    pub fn new(config: &Config) -> Result<Self> {
        let dispatcher = SearchDispatcher::new(config)?;
        let checker = Box::new(default_checker(config)?);
        Ok(Self::with_parts(dispatcher, checker, config))
    }

    pub fn with_parts(
        dispatcher: SearchDispatcher,
        checker: Box<dyn VulnerabilityChecker>,
        config: &Config,
    ) -> Self {
        Self {
            dispatcher,
            checker,
            writer: ReportWriter::from_config(config),
            ignore: config.ignore.clone(),
            policy: config.report_policy,
            strict_lookup: config.strict_lookup,
        }
    }

    pub fn with_writer(mut self, writer: ReportWriter) -> Self {
        self.writer = writer;
        self
    }

    pub fn with_policy(mut self, policy: ReportPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn search(&self, term: &str, ecosystem: Ecosystem) -> SearchOutcome {
        self.dispatcher.search_outcome(term, ecosystem).await
    }

    /// Looks up a package and drops advisories on the ignore list.
    pub async fn lookup(&self, target: &str, ecosystem: Ecosystem) -> LookupOutcome {
        match self.checker.lookup(target, ecosystem).await {
            LookupOutcome::Findings(records) => LookupOutcome::Findings(self.ignore.filter(records)),
            LookupOutcome::Unavailable => LookupOutcome::Unavailable,
        }
    }

    /// Runs the lookup for a chosen target and stamps the result.
    pub async fn complete(
        &self,
        target: &str,
        ecosystem: Ecosystem,
        search: Option<SearchOutcome>,
    ) -> CheckResult {
        let lookup = self.lookup(target, ecosystem).await;
        CheckResult {
            target: target.to_string(),
            ecosystem,
            search,
            lookup,
            generated_at: Local::now().naive_local(),
        }
    }

    /// Searches, takes the first candidate (or the term itself), and looks
    /// it up.
    pub async fn run(&self, term: &str, ecosystem: Ecosystem) -> CheckResult {
        let search = self.search(term, ecosystem).await;
        let target = select_target(term, &search.clone().into_candidates(), "");
        self.complete(&target, ecosystem, Some(search)).await
    }

    pub fn report_decision(&self, result: &CheckResult) -> ReportDecision {
        if self.strict_lookup && result.lookup.is_unavailable() {
            return ReportDecision::SkipLookupUnavailable;
        }

        match self.policy {
            ReportPolicy::Always => ReportDecision::Write,
            ReportPolicy::WhenFound if result.package_resolved() => ReportDecision::Write,
            ReportPolicy::WhenFound => ReportDecision::SkipNoCandidates,
        }
    }

    /// Renders and writes the report for a check, returning its path.
    pub fn write_report(&self, result: &CheckResult) -> Result<PathBuf> {
        let document = render_report(
            self.writer.format(),
            &result.target,
            Some(result.ecosystem),
            result.vulnerabilities(),
            result.generated_at,
        )?;
        self.writer.write(&result.target, &document, result.generated_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{RegistryError, RegistrySearch};
    use async_trait::async_trait;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_target_defaults_to_first() {
        let candidates = names(&["serde", "serde_json"]);
        assert_eq!(select_target("serde", &candidates, ""), "serde");
        assert_eq!(select_target("serde", &candidates, "   "), "serde");
    }

    #[test]
    fn test_select_target_by_number() {
        let candidates = names(&["a", "b", "c"]);
        assert_eq!(select_target("x", &candidates, "2"), "b");
        assert_eq!(select_target("x", &candidates, "3"), "c");
    }

    #[test]
    fn test_select_target_out_of_range_is_custom_name() {
        let candidates = names(&["a", "b"]);
        assert_eq!(select_target("x", &candidates, "0"), "0");
        assert_eq!(select_target("x", &candidates, "7"), "7");
        assert_eq!(select_target("x", &candidates, "my-pkg"), "my-pkg");
    }

    #[test]
    fn test_select_target_without_candidates_uses_input() {
        assert_eq!(select_target("typo-pkg", &[], "2"), "typo-pkg");
    }

    struct StaticRegistry(Vec<String>);

    #[async_trait]
    impl RegistrySearch for StaticRegistry {
        fn name(&self) -> &'static str {
            "static"
        }

        fn ecosystem(&self) -> Ecosystem {
            Ecosystem::Npm
        }

        async fn query(&self, _term: &str) -> std::result::Result<Vec<String>, RegistryError> {
            Ok(self.0.clone())
        }
    }

    struct StaticChecker(LookupOutcome);

    #[async_trait]
    impl VulnerabilityChecker for StaticChecker {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn lookup(&self, _package: &str, _ecosystem: Ecosystem) -> LookupOutcome {
            self.0.clone()
        }
    }

    fn runner(candidates: &[&str], outcome: LookupOutcome, config: &Config) -> CheckRunner {
        let mut dispatcher = SearchDispatcher::empty();
        dispatcher.register(Box::new(StaticRegistry(names(candidates))));
        CheckRunner::with_parts(dispatcher, Box::new(StaticChecker(outcome)), config)
    }

    #[tokio::test]
    async fn test_run_uses_first_candidate() {
        let outcome = LookupOutcome::Findings(vec![VulnerabilityRecord::new("GHSA-1", "bad")]);
        let runner = runner(&["lodash", "lodash-es"], outcome, &Config::default());

        let result = runner.run("lodash", Ecosystem::Npm).await;

        assert_eq!(result.target, "lodash");
        assert_eq!(result.candidates(), ["lodash", "lodash-es"]);
        assert_eq!(result.vulnerabilities().len(), 1);
        assert_eq!(runner.report_decision(&result), ReportDecision::Write);
    }

    #[tokio::test]
    async fn test_no_candidates_skips_report_when_found_policy() {
        let runner = runner(&[], LookupOutcome::Findings(vec![]), &Config::default());

        let result = runner.run("nothing-here", Ecosystem::Npm).await;

        assert_eq!(result.target, "nothing-here");
        assert_eq!(runner.report_decision(&result), ReportDecision::SkipNoCandidates);
    }

    #[tokio::test]
    async fn test_always_policy_writes_without_candidates() {
        let runner = runner(&[], LookupOutcome::Findings(vec![]), &Config::default())
            .with_policy(ReportPolicy::Always);

        let result = runner.run("nothing-here", Ecosystem::Npm).await;
        assert_eq!(runner.report_decision(&result), ReportDecision::Write);
    }

    #[tokio::test]
    async fn test_skipped_search_counts_as_resolved() {
        let runner = runner(&[], LookupOutcome::Findings(vec![]), &Config::default());

        let result = runner.complete("exact-name", Ecosystem::Npm, None).await;
        assert!(result.package_resolved());
        assert_eq!(runner.report_decision(&result), ReportDecision::Write);
    }

    #[tokio::test]
    async fn test_strict_lookup_skips_unavailable() {
        let config = Config {
            strict_lookup: true,
            ..Config::default()
        };
        let runner = runner(&["pkg"], LookupOutcome::Unavailable, &config);

        let result = runner.run("pkg", Ecosystem::Npm).await;
        assert!(result.vulnerabilities().is_empty());
        assert_eq!(
            runner.report_decision(&result),
            ReportDecision::SkipLookupUnavailable
        );
    }

    #[tokio::test]
    async fn test_lenient_lookup_writes_unavailable_as_safe() {
        let runner = runner(&["pkg"], LookupOutcome::Unavailable, &Config::default());
        let result = runner.run("pkg", Ecosystem::Npm).await;
        assert_eq!(runner.report_decision(&result), ReportDecision::Write);
    }

    #[tokio::test]
    async fn test_lookup_applies_ignore_list() {
        let mut config = Config::default();
        config.ignore.vulnerabilities = vec!["GHSA-ignored".to_string()];
        let outcome = LookupOutcome::Findings(vec![
            VulnerabilityRecord::new("GHSA-ignored", "accepted risk"),
            VulnerabilityRecord::new("GHSA-kept", "real"),
        ]);
        let runner = runner(&["pkg"], outcome, &config);

        let ids: Vec<_> = runner
            .lookup("pkg", Ecosystem::Npm)
            .await
            .into_records()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["GHSA-kept"]);
    }

    #[tokio::test]
    async fn test_write_report_uses_target_name() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(&["left-pad"], LookupOutcome::Findings(vec![]), &Config::default())
            .with_writer(ReportWriter::new(dir.path(), crate::output::ReportFormat::Markdown));

        let result = runner.run("left", Ecosystem::Npm).await;
        let path = runner.write_report(&result).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("Report_left-pad_"));
        assert!(name.ends_with(".md"));
        let doc = std::fs::read_to_string(path).unwrap();
        assert!(doc.contains("## Status: SAFE"));
        assert!(doc.contains("**Ecosystem:** npm"));
    }
}
