//! OSV.dev client against a wiremock server.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use osscheck::checker::{LookupOutcome, OsvChecker, VulnerabilityChecker};
use osscheck::registry::build_client;
use osscheck::Ecosystem;

fn checker(server: &MockServer) -> OsvChecker {
    let client = build_client("osscheck-tests", Duration::from_secs(5)).unwrap();
    OsvChecker::new(client, server.uri())
}

#[tokio::test]
async fn test_lookup_maps_advisories() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/query"))
        .and(body_json(json!({ "package": { "name": "lodash", "ecosystem": "npm" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "vulns": [{
                "id": "GHSA-p6mc-m468-83gw",
                "summary": "Prototype Pollution in lodash",
                "aliases": ["CVE-2020-8203"],
                "affected": [{
                    "package": { "name": "lodash", "ecosystem": "npm" },
                    "versions": ["4.17.15", "4.17.16", "4.17.15"]
                }]
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let records = checker(&server).check("lodash", Ecosystem::Npm).await;

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.id, "GHSA-p6mc-m468-83gw");
    assert_eq!(record.cve_ids, vec!["CVE-2020-8203"]);
    assert_eq!(record.summary, "Prototype Pollution in lodash");
    assert_eq!(
        record.details_url,
        "https://osv.dev/vulnerability/GHSA-p6mc-m468-83gw"
    );
    assert_eq!(record.affected_versions, vec!["4.17.15", "4.17.16"]);
}

#[tokio::test]
async fn test_empty_response_is_clean_result() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let outcome = checker(&server).lookup("serde", Ecosystem::Crates).await;
    assert_eq!(outcome, LookupOutcome::Findings(vec![]));
}

#[tokio::test]
async fn test_lookup_uses_osv_ecosystem_names() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/query"))
        .and(body_partial_json(json!({ "package": { "ecosystem": "crates.io" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "vulns": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = checker(&server).lookup("time", Ecosystem::Crates).await;
    assert!(!outcome.is_unavailable());
}

#[tokio::test]
async fn test_lookup_follows_page_tokens() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/query"))
        .and(body_partial_json(json!({ "page_token": "page-2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "vulns": [{ "id": "PYSEC-2", "summary": "second" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/query"))
        .and(body_json(json!({ "package": { "name": "django", "ecosystem": "PyPI" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "vulns": [{ "id": "PYSEC-1", "summary": "first" }],
            "next_page_token": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ids: Vec<_> = checker(&server)
        .check("django", Ecosystem::PyPI)
        .await
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec!["PYSEC-1", "PYSEC-2"]);
}

#[tokio::test]
async fn test_server_error_is_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/query"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let checker = checker(&server);
    assert_eq!(
        checker.lookup("requests", Ecosystem::PyPI).await,
        LookupOutcome::Unavailable
    );
    assert!(checker.check("requests", Ecosystem::PyPI).await.is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/query"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    assert!(checker(&server)
        .lookup("gin", Ecosystem::Go)
        .await
        .is_unavailable());
}
