// floe/src/commands/report.rs
//
// Terminal tables. Everything here goes to stderr so stdout stays clean for
// reports and digests.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use floe_core::domain::governance::EnforcementResult;
use floe_core::domain::plugin::PluginMetadata;

pub fn violations_table(result: &EnforcementResult) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Severity", "Code", "Model", "Message"]);

    for v in result.violations() {
        let model = match &v.column_name {
            Some(column) => format!("{}.{}", v.model_name, column),
            None => v.model_name.clone(),
        };
        let mut message = v.message.clone();
        if let Some(reason) = &v.override_applied {
            message.push_str(&format!(" (override: {})", reason));
        }
        table.add_row(vec![
            v.severity.to_string(),
            v.error_code.clone(),
            model,
            message,
        ]);
    }
    table
}

pub fn summary_line(result: &EnforcementResult) -> String {
    let summary = result.summary();
    format!(
        "{}: {} error(s), {} warning(s), {} info across {} model(s) [level {}, {} ms]",
        if summary.passed { "PASSED" } else { "FAILED" },
        summary.errors,
        summary.warnings,
        summary.infos,
        summary.models_validated,
        summary.enforcement_level,
        result.duration_ms()
    )
}

/// Prints the table (when there is anything to show) and the summary line.
pub fn print_enforcement(result: &EnforcementResult) {
    if !result.violations().is_empty() {
        eprintln!("{}", violations_table(result));
    }
    eprintln!("{}", summary_line(result));
}

pub fn plugins_table(plugins: &[PluginMetadata]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Capability", "Name", "Version", "API", "Description"]);
    for p in plugins {
        table.add_row(vec![
            p.capability.to_string(),
            p.name.clone(),
            p.version.clone(),
            p.api_version.clone(),
            p.description.clone(),
        ]);
    }
    table
}
