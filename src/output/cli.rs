use crate::checker::LookupOutcome;
use crate::model::Ecosystem;
use tabled::{settings::Style, Table, Tabled};

/// Versions shown per advisory on the console; the report has the rest.
const CONSOLE_VERSION_LIMIT: usize = 10;

#[derive(Tabled)]
struct CandidateRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Package")]
    name: String,
}

#[derive(Tabled)]
struct EcosystemRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Key")]
    key: &'static str,
    #[tabled(rename = "Registry")]
    registry: String,
    #[tabled(rename = "Search")]
    search: &'static str,
    #[tabled(rename = "")]
    current: &'static str,
}

pub fn print_candidates(ecosystem: Ecosystem, candidates: &[String]) {
    if candidates.is_empty() {
        println!("No candidates found in {}.", ecosystem);
        return;
    }

    println!("Found {} candidate(s):", candidates.len());

    let rows: Vec<CandidateRow> = candidates
        .iter()
        .enumerate()
        .map(|(i, name)| CandidateRow {
            index: i + 1,
            name: name.clone(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

pub fn print_ecosystems(current: Option<Ecosystem>) {
    let rows: Vec<EcosystemRow> = Ecosystem::ALL
        .iter()
        .enumerate()
        .map(|(i, e)| EcosystemRow {
            index: i + 1,
            key: e.as_str(),
            registry: format!("{} ({})", e.display_name(), e.language()),
            search: if e.is_existence_probe() {
                "exact name"
            } else {
                "keyword"
            },
            current: if Some(*e) == current { "*" } else { "" },
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

pub fn print_findings(package: &str, ecosystem: Ecosystem, outcome: &LookupOutcome) {
    let vulns = match outcome {
        LookupOutcome::Unavailable => {
            println!();
            println!(
                "\x1b[33m[UNKNOWN]\x1b[0m Could not query the vulnerability database for '{}'.",
                package
            );
            return;
        }
        LookupOutcome::Findings(vulns) => vulns,
    };

    if vulns.is_empty() {
        println!();
        println!(
            "\x1b[32m[SAFE]\x1b[0m No vulnerabilities reported for '{}' in OSV database ({} ecosystem).",
            package, ecosystem
        );
        return;
    }

    println!();
    println!(
        "\x1b[31m[WARNING]\x1b[0m Found {} vulnerability record(s) for '{}':",
        vulns.len(),
        package
    );

    for v in vulns {
        println!("--------------------------------------------------");
        println!("ID:      {}", v.id);
        if !v.cve_ids.is_empty() {
            println!("CVE:     {}", v.cve_ids.join(", "));
        }
        println!("Summary: {}", v.summary);
        println!("URL:     {}", v.details_url);
        println!("Affected Versions ({}):", v.affected_versions.len());
        println!("  {}", compact_versions(&v.affected_versions, CONSOLE_VERSION_LIMIT));
    }
    println!("--------------------------------------------------");
}

/// Joins the first `limit` versions, noting how many more the report lists.
pub fn compact_versions(versions: &[String], limit: usize) -> String {
    if versions.len() > limit {
        format!(
            "{} ... and {} more (see report)",
            versions[..limit].join(", "),
            versions.len() - limit
        )
    } else {
        versions.join(", ")
    }
}
