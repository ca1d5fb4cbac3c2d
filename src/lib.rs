pub mod check;
pub mod checker;
pub mod config;
pub mod model;
pub mod output;
pub mod registry;

pub use check::{select_target, CheckResult, CheckRunner, ReportDecision};
pub use checker::{LookupOutcome, OsvChecker, VulnerabilityChecker};
pub use config::Config;
pub use model::{Ecosystem, VulnerabilityRecord};
pub use output::{ReportFormat, ReportWriter};
pub use registry::{RegistrySearch, SearchDispatcher, SearchOutcome};
