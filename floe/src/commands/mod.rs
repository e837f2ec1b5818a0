// floe/src/commands/mod.rs

pub mod compile;
pub mod enforce;
pub mod plugins;
pub mod report;

use chrono::{DateTime, SecondsFormat, Utc};
use floe_core::application::CompileOptions;
use floe_core::ports::EnvSource;

use crate::cli::InputArgs;

/// Reproducible builds: when set, the compile date and timestamp both come
/// from this epoch instead of the wall clock.
pub const SOURCE_DATE_EPOCH: &str = "SOURCE_DATE_EPOCH";

/// Options shared by `compile` and `enforce`.
pub fn base_options(input: &InputArgs, env: &dyn EnvSource) -> miette::Result<CompileOptions> {
    let (today, compiled_at) = match env.var(SOURCE_DATE_EPOCH) {
        Some(raw) => {
            let instant = parse_epoch(&raw)?;
            (
                instant.date_naive(),
                Some(instant.to_rfc3339_opts(SecondsFormat::Secs, true)),
            )
        }
        None => (Utc::now().date_naive(), None),
    };
    let mut options = CompileOptions::new(today);
    options.compiled_at = compiled_at;
    options.include_context = input.include_context;
    options.parallel_validators = !input.sequential;
    Ok(options)
}

fn parse_epoch(raw: &str) -> miette::Result<DateTime<Utc>> {
    let secs: i64 = raw
        .trim()
        .parse()
        .map_err(|_| miette::miette!("{} is not a number of seconds: '{}'", SOURCE_DATE_EPOCH, raw))?;
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| miette::miette!("{} is out of range: {}", SOURCE_DATE_EPOCH, secs))
}
