// floe-core/src/domain/resolution/mod.rs

pub mod checks;
pub mod error;
pub mod inheritance;
pub mod model;
pub mod resolver;
pub mod secrets;

pub use checks::{checks_for_transform, dedup_checks};
pub use error::ResolutionError;
pub use inheritance::effective_manifest;
pub use model::{ResolvedColumn, ResolvedModel};
pub use resolver::{Resolution, ResolvedPlugin, Resolver, extract_refs, extract_sources};
pub use secrets::{SENSITIVE_KEYS, scan_config};
