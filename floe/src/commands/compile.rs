// floe/src/commands/compile.rs
//
// USE CASE: Compile a data product into its artifacts.

use std::path::PathBuf;
use std::process::ExitCode;

use floe_core::FloeError;
use floe_core::application::{CompileContext, compile_files, publish};
use floe_core::domain::plugin::PluginRegistry;
use floe_core::infrastructure::config::load_check_results;
use floe_core::infrastructure::error::InfrastructureError;
use floe_core::infrastructure::fs::atomic_write;
use floe_core::infrastructure::{LocalArtifactStore, ProcessEnv};
use tracing::info;

use super::base_options;
use super::report::print_enforcement;
use crate::cli::InputArgs;

pub struct CompileArgs {
    pub input: InputArgs,
    pub output: PathBuf,
    pub store: Option<PathBuf>,
    pub check_results: Option<PathBuf>,
    pub allow_violations: bool,
    pub target: String,
}

pub async fn execute(args: CompileArgs) -> miette::Result<ExitCode> {
    let env = ProcessEnv;
    let registry = PluginRegistry::with_builtins();
    let ctx = CompileContext {
        registry: &registry,
        env: &env,
    };

    let mut options = base_options(&args.input, &env)?;
    options.target = args.target;
    options.fail_on_violations = !args.allow_violations;
    if let Some(path) = &args.check_results {
        options.check_results = load_check_results(path).map_err(InfrastructureError::from)?;
    }

    let outcome = match compile_files(&args.input.spec, &args.input.manifest, &ctx, &options) {
        Ok(outcome) => outcome,
        Err(e) => {
            if let FloeError::EnforcementFailed { result, .. } = &e {
                print_enforcement(result);
            }
            return Err(e.into());
        }
    };
    print_enforcement(&outcome.enforcement);

    let json = outcome.artifacts.to_json_pretty().map_err(FloeError::from)?;
    atomic_write(&args.output, format!("{}\n", json))?;
    info!(path = %args.output.display(), "Artifacts written");

    if let Some(root) = &args.store {
        let store = LocalArtifactStore::new(root);
        let descriptor = publish(&store, &outcome.artifacts).await?;
        eprintln!(
            "Published {} ({} bytes) to {}",
            descriptor.digest,
            descriptor.size,
            store.root().display()
        );
    }

    eprintln!(
        "Quality score {:.1} for {} model(s), artifacts at {}",
        outcome.quality.aggregate_score,
        outcome.resolution.models.len(),
        args.output.display()
    );
    println!("{}", outcome.digest);
    Ok(ExitCode::SUCCESS)
}
