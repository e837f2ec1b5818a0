// floe/src/commands/enforce.rs
//
// USE CASE: Policy enforcement only, with a JSON / SARIF / HTML report.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use floe_core::application::{CompileContext, enforce_files};
use floe_core::domain::plugin::PluginRegistry;
use floe_core::infrastructure::ProcessEnv;
use floe_core::infrastructure::error::InfrastructureError;
use floe_core::infrastructure::exporters::{ReportFormat, export_report};

use super::base_options;
use super::report::print_enforcement;
use crate::cli::InputArgs;

pub fn execute(
    input: InputArgs,
    format: ReportFormat,
    output: Option<PathBuf>,
) -> miette::Result<ExitCode> {
    let env = ProcessEnv;
    let registry = PluginRegistry::with_builtins();
    let ctx = CompileContext {
        registry: &registry,
        env: &env,
    };
    let options = base_options(&input, &env)?;

    let outcome = enforce_files(&input.spec, &input.manifest, &ctx, &options)?;
    let result = &outcome.enforcement;

    match &output {
        Some(path) => {
            export_report(result, format, path)?;
            eprintln!("{} report written to {}", format, path.display());
        }
        None => {
            let content = format.render(result)?;
            std::io::stdout()
                .write_all(content.as_bytes())
                .map_err(InfrastructureError::Io)?;
        }
    }
    print_enforcement(result);

    Ok(if result.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
