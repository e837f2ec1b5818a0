// floe-core/src/infrastructure/exporters/mod.rs

pub mod html;
pub mod json;
pub mod sarif;

pub use html::render_html;
pub use json::{parse_json, render_json};
pub use sarif::{SarifLog, parse_sarif, render_sarif, to_sarif};

use crate::domain::governance::EnforcementResult;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::atomic_write;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Json,
    Sarif,
    Html,
}

impl ReportFormat {
    pub fn render(&self, result: &EnforcementResult) -> Result<String, InfrastructureError> {
        match self {
            Self::Json => render_json(result),
            Self::Sarif => render_sarif(result),
            Self::Html => render_html(result),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Json => "json",
            Self::Sarif => "sarif",
            Self::Html => "html",
        };
        f.write_str(s)
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "sarif" => Ok(Self::Sarif),
            "html" => Ok(Self::Html),
            other => Err(format!(
                "Unknown report format '{}' (expected json, sarif or html)",
                other
            )),
        }
    }
}

/// Renders `result` and writes it atomically, creating parent directories.
#[instrument(skip(result), fields(format = %format))]
pub fn export_report(
    result: &EnforcementResult,
    format: ReportFormat,
    path: &Path,
) -> Result<(), InfrastructureError> {
    let content = format.render(result)?;
    atomic_write(path, &content)?;
    info!(path = %path.display(), bytes = content.len(), "Report written");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::governance::EnforcementLevel;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn test_export_every_format() -> Result<()> {
        let dir = tempdir()?;
        let result = EnforcementResult::new(vec![], EnforcementLevel::Warn, 2, 1);
        for format in [ReportFormat::Json, ReportFormat::Sarif, ReportFormat::Html] {
            let path = dir.path().join(format!("reports/enforcement.{}", format));
            export_report(&result, format, &path)?;
            assert!(std::fs::metadata(&path)?.len() > 0);
        }
        let sarif = std::fs::read_to_string(dir.path().join("reports/enforcement.sarif"))?;
        assert_eq!(parse_sarif(&sarif)?, result);
        Ok(())
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("SARIF".parse::<ReportFormat>().unwrap(), ReportFormat::Sarif);
        assert!("xml".parse::<ReportFormat>().is_err());
    }
}
