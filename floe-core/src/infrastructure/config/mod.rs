// floe-core/src/infrastructure/config/mod.rs

pub mod env;
pub mod loader;
mod salvage;

pub use env::{DEFAULT_TARGET, ENV_ENFORCEMENT_LEVEL, ENV_TARGET, EnvOverrides};
pub use loader::{
    load_check_results, load_manifest, load_manifest_chain, load_spec, parse_manifest, parse_spec,
};
