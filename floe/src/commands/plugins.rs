// floe/src/commands/plugins.rs
//
// USE CASE: List what the registry discovers.

use std::process::ExitCode;

use floe_core::domain::plugin::PluginRegistry;

use super::report::plugins_table;

pub fn execute() -> miette::Result<ExitCode> {
    let registry = PluginRegistry::with_builtins();
    let mut plugins = registry.list();
    plugins.sort_by(|a, b| {
        a.capability
            .to_string()
            .cmp(&b.capability.to_string())
            .then_with(|| a.name.cmp(&b.name))
    });
    println!("{}", plugins_table(&plugins));
    Ok(ExitCode::SUCCESS)
}
