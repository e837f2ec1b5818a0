// floe/src/main.rs

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

use cli::{Cli, Commands};
use commands::compile::CompileArgs;

#[tokio::main]
async fn main() -> miette::Result<ExitCode> {
    let cli = Cli::parse();

    // 1. Setup Logging (Tracing), on stderr: stdout carries reports and digests
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Compile {
            input,
            output,
            store,
            check_results,
            allow_violations,
            target,
        } => {
            commands::compile::execute(CompileArgs {
                input,
                output,
                store,
                check_results,
                allow_violations,
                target,
            })
            .await
        }

        Commands::Enforce {
            input,
            format,
            output,
        } => commands::enforce::execute(input, format.into(), output),

        Commands::Plugins => commands::plugins::execute(),
    }
}
