use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use super::ReportFormat;
use crate::config::Config;

/// Persists rendered reports as `Report_<package>_<timestamp>.<ext>` files.
pub struct ReportWriter {
    dir: PathBuf,
    format: ReportFormat,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>, format: ReportFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.report_dir(), config.report_format)
    }

    pub fn format(&self) -> ReportFormat {
        self.format
    }

    /// Writes the document and returns its absolute path.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written.
    pub fn write(&self, package: &str, document: &str, generated_at: NaiveDateTime) -> Result<PathBuf> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).with_context(|| {
                format!("Failed to create report directory {}", self.dir.display())
            })?;
        }

        let path = self
            .dir
            .join(report_file_name(package, self.format, generated_at));
        fs::write(&path, document)
            .with_context(|| format!("Failed to write report file {}", path.display()))?;

        let path = fs::canonicalize(&path).unwrap_or(path);
        info!(path = %path.display(), "report written");
        Ok(path)
    }
}

/// Builds the report file name for a package and timestamp.
///
/// Characters that are unsafe in file names (such as the `/` of scoped npm
/// packages or the `:` of Maven coordinates) are replaced with `_`.
///
/// ```
/// use chrono::NaiveDate;
/// use osscheck::output::{report_file_name, ReportFormat};
///
/// let at = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(9, 30, 0).unwrap();
/// assert_eq!(
///     report_file_name("@babel/core", ReportFormat::Markdown, at),
///     "Report__babel_core_20240501093000.md"
/// );
/// ```
pub fn report_file_name(package: &str, format: ReportFormat, generated_at: NaiveDateTime) -> String {
    format!(
        "Report_{}_{}.{}",
        sanitize_file_component(package),
        generated_at.format("%Y%m%d%H%M%S"),
        format.extension()
    )
}

fn sanitize_file_component(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if safe.chars().all(|c| c == '.') {
        "package".to_string()
    } else {
        safe
    }
}
