// floe-core/src/domain/plugin/error.rs

use super::CapabilityKind;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum PluginError {
    #[error("Plugin '{name}' not found for capability '{kind}'")]
    #[diagnostic(
        code(floe::plugin::not_found),
        help("Run `floe plugins` to list the plugins available for each capability.")
    )]
    NotFound { kind: CapabilityKind, name: String },

    #[error(
        "Plugin '{name}' ({kind}) declares API version {plugin_version}, incompatible with required {required_version}"
    )]
    #[diagnostic(
        code(floe::plugin::incompatible),
        help("The plugin MAJOR must match the host and its MINOR must be at least the host's.")
    )]
    Incompatible {
        kind: CapabilityKind,
        name: String,
        plugin_version: String,
        required_version: String,
    },

    #[error("Plugin '{name}' is registered for '{kind}' but does not implement that capability")]
    #[diagnostic(code(floe::plugin::capability_unsupported))]
    CapabilityUnsupported { kind: CapabilityKind, name: String },

    #[error("Invalid configuration for plugin '{name}' ({kind}): {}", .issues.join("; "))]
    #[diagnostic(code(floe::plugin::invalid_config))]
    InvalidConfig {
        kind: CapabilityKind,
        name: String,
        issues: Vec<String>,
    },
}
