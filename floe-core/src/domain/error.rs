// floe-core/src/domain/error.rs

use crate::domain::plugin::PluginError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Circular dependency detected: {0}")]
    #[diagnostic(
        code(floe::domain::cycle),
        help("Check the depends_on lists and {{ ref() }} calls of the listed transforms.")
    )]
    CircularDependency(String),

    #[error("Transform '{0}' not found in the resolved model set")]
    #[diagnostic(code(floe::domain::model_not_found))]
    ModelNotFound(String),

    #[error("Artifact serialization failed: {0}")]
    #[diagnostic(code(floe::domain::serialization))]
    Serialization(#[from] serde_json::Error),

    #[error("Compiler error: {0}")]
    #[diagnostic(code(floe::domain::compiler))]
    Compiler(String),

    #[error("Unsupported compiled artifacts version {found} (this build reads {supported})")]
    #[diagnostic(
        code(floe::domain::artifacts_version),
        help("Recompile the data product with a matching floe release.")
    )]
    UnsupportedArtifactsVersion { found: String, supported: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Plugin(#[from] PluginError),
}
