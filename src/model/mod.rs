//! Core data types for ecosystems and vulnerability records.
//!
//! - [`Ecosystem`] - One of the supported package registries
//! - [`VulnerabilityRecord`] - A single advisory affecting a package
//!
//! # Example
//!
//! ```
//! use osscheck::{Ecosystem, VulnerabilityRecord};
//!
//! let ecosystem = Ecosystem::parse("CRATES.IO").unwrap();
//! assert_eq!(ecosystem, Ecosystem::Crates);
//!
//! let record = VulnerabilityRecord::new("RUSTSEC-2021-0001", "Use after free");
//! assert!(record.cve_ids.is_empty());
//! ```

mod ecosystem;
mod vulnerability;

pub use ecosystem::*;
pub use vulnerability::*;
