// floe-core/src/error.rs

use crate::domain::error::DomainError;
use crate::domain::governance::{EnforcementError, EnforcementResult};
use crate::domain::identity::IdentityError;
use crate::domain::plugin::PluginError;
use crate::domain::quality::ScoringError;
use crate::domain::resolution::ResolutionError;
use crate::infrastructure::error::InfrastructureError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum FloeError {
    // --- INPUT / IO (YAML, schema validation, filesystem, store) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- RESOLUTION (approval, scope, references, inheritance) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolution(#[from] ResolutionError),

    // --- PLUGINS (lookup outside of resolution) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Plugin(#[from] PluginError),

    // --- ENFORCEMENT CONFIGURATION ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Enforcement(#[from] EnforcementError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Scoring(#[from] ScoringError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Identity(#[from] IdentityError),

    // --- DOMAIN (planning, compiler) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Domain(#[from] DomainError),

    /// Enforcement completed but did not pass, and the caller asked to abort.
    #[error("Policy enforcement failed with {error_count} error(s)")]
    #[diagnostic(
        code(floe::enforcement::failed),
        help("Fix the reported violations or configure a policy override.")
    )]
    EnforcementFailed {
        error_count: usize,
        result: Box<EnforcementResult>,
    },
}

// Manual implementation to avoid a duplicate variant but keep `?` on IO calls
impl From<std::io::Error> for FloeError {
    fn from(err: std::io::Error) -> Self {
        FloeError::Infrastructure(InfrastructureError::Io(err))
    }
}
