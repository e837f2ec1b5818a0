// floe/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand, ValueEnum};
use floe_core::infrastructure::exporters::ReportFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "floe")]
#[command(about = "Compiler and policy enforcement engine for declarative data products", long_about = None)]
#[command(version)]
pub struct Cli {
    /// More logs on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Inputs shared by every command that reads a data product.
#[derive(clap::Args, Debug, Clone)]
pub struct InputArgs {
    /// Data product spec
    #[arg(long, default_value = "floe.yaml")]
    pub spec: PathBuf,

    /// Platform manifest (domain manifests pull their enterprise parent)
    #[arg(long, default_value = "manifest.yaml")]
    pub manifest: PathBuf,

    /// Fill downstream_impact on every violation
    #[arg(long)]
    pub include_context: bool,

    /// Run validators one after the other instead of on the thread pool
    #[arg(long)]
    pub sequential: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolves, enforces, scores and writes the compiled artifacts
    Compile {
        #[command(flatten)]
        input: InputArgs,

        /// Where to write the compiled artifacts
        #[arg(long, short, default_value = "target/compiled_artifacts.json")]
        output: PathBuf,

        /// Also publish the artifacts to a content-addressed store directory
        #[arg(long)]
        store: Option<PathBuf>,

        /// Observed check outcomes (JSON or YAML list) used for scoring
        #[arg(long)]
        check_results: Option<PathBuf>,

        /// Generate artifacts even when enforcement fails
        #[arg(long)]
        allow_violations: bool,

        /// dbt target name of the platform compute
        #[arg(long, env = "FLOE_TARGET", default_value = "dev")]
        target: String,
    },

    /// Runs policy enforcement only and writes a report
    Enforce {
        #[command(flatten)]
        input: InputArgs,

        #[arg(long, short, value_enum, default_value_t = Format::Json)]
        format: Format,

        /// Report file; stdout when omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Lists the builtin plugins
    Plugins,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Sarif,
    Html,
}

impl From<Format> for ReportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => ReportFormat::Json,
            Format::Sarif => ReportFormat::Sarif,
            Format::Html => ReportFormat::Html,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_defaults() {
        let cli = Cli::parse_from(["floe", "compile"]);
        match cli.command {
            Commands::Compile {
                input,
                output,
                store,
                allow_violations,
                ..
            } => {
                assert_eq!(input.spec.to_string_lossy(), "floe.yaml");
                assert_eq!(input.manifest.to_string_lossy(), "manifest.yaml");
                assert_eq!(output.to_string_lossy(), "target/compiled_artifacts.json");
                assert!(store.is_none());
                assert!(!allow_violations);
            }
            _ => panic!("Expected Compile command"),
        }
    }

    #[test]
    fn test_enforce_format() {
        let cli = Cli::parse_from(["floe", "-vv", "enforce", "--format", "sarif"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Enforce { format, output, .. } => {
                assert_eq!(ReportFormat::from(format), ReportFormat::Sarif);
                assert!(output.is_none());
            }
            _ => panic!("Expected Enforce command"),
        }
    }
}
