use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use osscheck::{
    check::{select_target, CheckResult, CheckRunner, ReportDecision},
    config::{Config, ReportPolicy},
    model::Ecosystem,
    output::{print_candidates, print_ecosystems, print_findings, ReportFormat},
    registry::SearchOutcome,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const FINDINGS: u8 = 2;
}

#[derive(Parser)]
#[command(name = "osscheck")]
#[command(
    author,
    version,
    about = "Search package registries and check packages for known vulnerabilities"
)]
struct Cli {
    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive menu (default)
    Interactive {
        /// Ecosystem to start in
        #[arg(short, long)]
        ecosystem: Option<Ecosystem>,
    },

    /// Search a registry and list candidate packages
    Search {
        term: String,

        /// Ecosystem key (nuget, npm, pypi, maven, go, crates, rubygems, packagist, pub)
        #[arg(short, long)]
        ecosystem: Option<Ecosystem>,
    },

    /// Check one package for vulnerabilities and write a report
    Check {
        package: String,

        /// Ecosystem key (nuget, npm, pypi, maven, go, crates, rubygems, packagist, pub)
        #[arg(short, long)]
        ecosystem: Option<Ecosystem>,

        /// Check the Nth search candidate instead of the first
        #[arg(long, conflicts_with = "no_search")]
        pick: Option<usize>,

        /// Check the package name as given, without searching the registry
        #[arg(long)]
        no_search: bool,

        /// Report format
        #[arg(short, long, value_enum)]
        format: Option<ReportFormat>,

        /// Directory to write the report to
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// When to write a report
        #[arg(long, value_enum)]
        report_policy: Option<ReportPolicy>,

        /// Print results without writing a report
        #[arg(long)]
        no_report: bool,

        /// Exit with code 2 if any vulnerability is found
        #[arg(long)]
        fail_on_findings: bool,
    },

    /// List supported ecosystems
    ListEcosystems,

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

async fn run() -> Result<u8> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring unreadable config file");
            Config::default()
        }),
    };

    match cli.command.unwrap_or(Commands::Interactive { ecosystem: None }) {
        Commands::Interactive { ecosystem } => {
            let ecosystem = ecosystem.unwrap_or(config.default_ecosystem);
            run_interactive(&config, ecosystem).await?;
            Ok(exit_codes::SUCCESS)
        }
        Commands::Search { term, ecosystem } => {
            let ecosystem = ecosystem.unwrap_or(config.default_ecosystem);
            let runner = CheckRunner::new(&config)?;
            let candidates = search_with_spinner(&runner, &term, ecosystem)
                .await
                .into_candidates();
            print_candidates(ecosystem, &candidates);
            Ok(exit_codes::SUCCESS)
        }
        Commands::Check {
            package,
            ecosystem,
            pick,
            no_search,
            format,
            output_dir,
            report_policy,
            no_report,
            fail_on_findings,
        } => {
            let mut config = config;
            if let Some(format) = format {
                config.report_format = format;
            }
            if let Some(dir) = output_dir {
                config.report_dir = Some(dir);
            }
            if let Some(policy) = report_policy {
                config.report_policy = policy;
            }
            let ecosystem = ecosystem.unwrap_or(config.default_ecosystem);

            run_check(
                &config,
                &package,
                ecosystem,
                pick,
                no_search,
                !no_report,
                fail_on_findings,
            )
            .await
        }
        Commands::ListEcosystems => {
            print_ecosystems(Some(config.default_ecosystem));
            Ok(exit_codes::SUCCESS)
        }
        Commands::Config { init, path } => {
            handle_config(cli.config, init, path)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = if verbose {
        EnvFilter::new(default_level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn run_check(
    config: &Config,
    package: &str,
    ecosystem: Ecosystem,
    pick: Option<usize>,
    no_search: bool,
    write_report: bool,
    fail_on_findings: bool,
) -> Result<u8> {
    let runner = CheckRunner::new(config)?;

    let (target, search) = if no_search {
        (package.to_string(), None)
    } else {
        let outcome = search_with_spinner(&runner, package, ecosystem).await;
        let candidates = outcome.clone().into_candidates();
        print_candidates(ecosystem, &candidates);

        let selection = pick.map(|n| n.to_string()).unwrap_or_default();
        if let Some(n) = pick {
            if n == 0 || n > candidates.len() {
                anyhow::bail!(
                    "--pick {} is out of range: the search returned {} candidate(s)",
                    n,
                    candidates.len()
                );
            }
        }
        (select_target(package, &candidates, &selection), Some(outcome))
    };

    let result = lookup_with_spinner(&runner, &target, ecosystem, search).await;
    print_findings(&result.target, ecosystem, &result.lookup);

    if write_report {
        save_report(&runner, &result);
    }

    if fail_on_findings && !result.vulnerabilities().is_empty() {
        Ok(exit_codes::FINDINGS)
    } else {
        Ok(exit_codes::SUCCESS)
    }
}

async fn run_interactive(config: &Config, ecosystem: Ecosystem) -> Result<()> {
    let runner = CheckRunner::new(config)?;
    let mut ecosystem = ecosystem;

    println!("==========================================");
    println!("   OSS Vulnerability Checker (OSV.dev)");
    println!("==========================================");

    loop {
        println!();
        println!("Current ecosystem: {}", ecosystem.display_name());
        println!("  [1] Search / check a package");
        println!("  [2] Switch ecosystem");
        println!("  [Q] Quit");

        let Some(choice) = prompt("Select an option: ")? else {
            break;
        };

        match choice.trim().to_lowercase().as_str() {
            "1" => {
                if ecosystem.is_existence_probe() {
                    println!(
                        "Note: {} has no search API; enter the exact package name.",
                        ecosystem.display_name()
                    );
                }
                let Some(term) = prompt("Enter package name: ")? else {
                    break;
                };
                let term = term.trim();
                if term.is_empty() {
                    continue;
                }
                interactive_check(&runner, term, ecosystem).await?;
            }
            "2" => {
                print_ecosystems(Some(ecosystem));
                let Some(choice) = prompt("Enter ecosystem number or key: ")? else {
                    break;
                };
                match Ecosystem::from_menu_choice(&choice) {
                    Some(selected) => {
                        ecosystem = selected;
                        println!("Switched to {}.", ecosystem.display_name());
                    }
                    None => println!(
                        "Unknown ecosystem '{}', keeping {}.",
                        choice.trim(),
                        ecosystem.display_name()
                    ),
                }
            }
            "q" => break,
            other => println!("Unknown option '{}'.", other),
        }
    }

    Ok(())
}

async fn interactive_check(runner: &CheckRunner, term: &str, ecosystem: Ecosystem) -> Result<()> {
    let outcome = search_with_spinner(runner, term, ecosystem).await;
    let candidates = outcome.clone().into_candidates();
    print_candidates(ecosystem, &candidates);

    let selection = if candidates.is_empty() {
        String::new()
    } else {
        prompt("Select a package [ENTER = 1, number, or type a name]: ")?.unwrap_or_default()
    };
    let target = select_target(term, &candidates, &selection);

    let result = lookup_with_spinner(runner, &target, ecosystem, Some(outcome)).await;
    print_findings(&result.target, ecosystem, &result.lookup);
    save_report(runner, &result);
    Ok(())
}

/// Writes the report if the runner's policy allows it. A failed write is
/// reported but does not end the session.
fn save_report(runner: &CheckRunner, result: &CheckResult) {
    match runner.report_decision(result) {
        ReportDecision::Write => match runner.write_report(result) {
            Ok(path) => {
                println!();
                println!("Report saved to: {}", path.display());
            }
            Err(e) => {
                tracing::error!(package = %result.target, error = %e, "report write failed");
                eprintln!("\x1b[31mFailed to write report:\x1b[0m {:#}", e);
            }
        },
        ReportDecision::SkipNoCandidates => {
            println!();
            println!("Package not found in the registry; no report written.");
        }
        ReportDecision::SkipLookupUnavailable => {
            println!();
            println!("Vulnerability database unavailable; no report written.");
        }
    }
}

async fn search_with_spinner(runner: &CheckRunner, term: &str, ecosystem: Ecosystem) -> SearchOutcome {
    let pb = spinner(format!("Searching {} for '{}'...", ecosystem.display_name(), term));
    let outcome = runner.search(term, ecosystem).await;
    pb.finish_and_clear();

    if outcome.is_failure() {
        println!(
            "\x1b[33mCould not query {}; continuing without candidates.\x1b[0m",
            ecosystem.display_name()
        );
    }
    outcome
}

async fn lookup_with_spinner(
    runner: &CheckRunner,
    target: &str,
    ecosystem: Ecosystem,
    search: Option<SearchOutcome>,
) -> CheckResult {
    let pb = spinner(format!("Checking '{}' against OSV.dev...", target));
    let result = runner.complete(target, ecosystem, search).await;
    pb.finish_and_clear();
    result
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    pb
}

/// Prints a prompt and reads one line. `None` at end of input.
fn prompt(message: &str) -> Result<Option<String>> {
    print!("{}", message);
    io::stdout().flush()?;

    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

fn handle_config(explicit: Option<PathBuf>, init: bool, show_path: bool) -> Result<()> {
    let config_path = explicit.unwrap_or_else(Config::config_path);

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save_to(&config_path)?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'osscheck config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
