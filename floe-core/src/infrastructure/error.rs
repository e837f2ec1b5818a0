// floe-core/src/infrastructure/error.rs

use crate::domain::spec::FieldError;
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

fn render_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("\n  - {}", e))
        .collect::<String>()
}

/// Input errors: anything wrong with floe.yaml / manifest.yaml, reported
/// before any stage runs.
#[derive(Error, Debug, Diagnostic)]
pub enum LoadError {
    #[error("Cannot read {document} at '{}': {source}", .path.display())]
    #[diagnostic(
        code(floe::load::io),
        help("Check the path and file permissions.")
    )]
    Io {
        document: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid YAML in {document}: {source}")]
    #[diagnostic(
        code(floe::load::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    Yaml {
        document: &'static str,
        source: serde_yaml::Error,
    },

    #[error("{document} failed validation ({} error(s)):{}", .errors.len(), render_errors(.errors))]
    #[diagnostic(
        code(floe::load::validation),
        help("Every failing field is listed; fix them all before recompiling.")
    )]
    Validation {
        document: &'static str,
        errors: Vec<FieldError>,
    },

    #[error("Invalid manifest inheritance at '{}': {reason}", .path.display())]
    #[diagnostic(
        code(floe::load::inheritance),
        help("Only a domain manifest may declare parent_manifest, and its parent must be an enterprise manifest.")
    )]
    Inheritance { path: PathBuf, reason: String },
}

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- INPUT DOCUMENTS ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Load(#[from] LoadError),

    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(floe::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- SERIALIZATION ---
    #[error("JSON Error: {0}")]
    #[diagnostic(code(floe::infra::json))]
    Json(#[from] serde_json::Error),

    #[error("Unreadable report: {0}")]
    #[diagnostic(code(floe::infra::report))]
    InvalidReport(String),

    #[error("Configuration Error: {0}")]
    #[diagnostic(code(floe::infra::config))]
    ConfigError(String),

    // --- TEMPLATING ---
    #[error("Template Rendering Error: {0}")]
    #[diagnostic(
        code(floe::infra::template),
        help("The HTML report template failed to render.")
    )]
    TemplateError(#[from] minijinja::Error),

    // --- ARTIFACT STORE ---
    #[error("Malformed digest '{0}' (expected sha256:<64 hex chars>)")]
    #[diagnostic(code(floe::infra::store::digest))]
    InvalidDigest(String),

    #[error("Blob {0} not found in the artifact store")]
    #[diagnostic(code(floe::infra::store::not_found))]
    BlobNotFound(String),

    #[error("Stored blob is corrupt: expected {expected}, found {actual}")]
    #[diagnostic(
        code(floe::infra::store::corrupt),
        help("Delete the blob and publish the artifacts again.")
    )]
    DigestMismatch { expected: String, actual: String },
}
