// floe-core/src/domain/resolution/error.rs

use crate::domain::plugin::{CapabilityKind, PluginError};
use crate::domain::spec::MaterializationType;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum ResolutionError {
    #[error("Plugin '{plugin}' is not approved for capability '{capability}' (approved: {})", .approved.join(", "))]
    #[diagnostic(
        code(floe::resolution::not_approved),
        help("Select one of the approved plugins or ask the platform team to extend approved_plugins.")
    )]
    PlanNotApproved {
        capability: CapabilityKind,
        plugin: String,
        approved: Vec<String>,
    },

    #[error("Spec-level override of '{capability}' rejected: {reason}")]
    #[diagnostic(
        code(floe::resolution::scope_violation),
        help("Remove the `plugins.{capability}` block from floe.yaml; the platform manifest owns it.")
    )]
    ScopeViolation {
        capability: CapabilityKind,
        reason: String,
    },

    #[error("Transform '{model}' references '{reference}', which is not defined in the spec")]
    #[diagnostic(
        code(floe::resolution::unresolved_reference),
        help("Add the missing transform or fix the depends_on / ref() name.")
    )]
    UnresolvedReference { model: String, reference: String },

    #[error("Manifest '{manifest}' weakens inherited governance: {field} ({reason})")]
    #[diagnostic(
        code(floe::resolution::governance_weakened),
        help("A domain manifest may only tighten the governance of its enterprise parent.")
    )]
    GovernanceWeakened {
        manifest: String,
        field: String,
        reason: String,
    },

    #[error("Plaintext secret in '{capability}' plugin config key '{key}'")]
    #[diagnostic(
        code(floe::resolution::plaintext_secret),
        help("Reference the value through env_var('NAME') or a secret_ref mapping instead.")
    )]
    PlaintextSecret {
        capability: CapabilityKind,
        key: String,
    },

    #[error("No plugin selected for required capability '{0}'")]
    #[diagnostic(
        code(floe::resolution::missing_capability),
        help("Declare the capability under `plugins:` in the platform manifest.")
    )]
    MissingCapability(CapabilityKind),

    #[error("Transform '{model}' uses materialization '{materialization}', unsupported by compute '{compute}'")]
    #[diagnostic(code(floe::resolution::unsupported_materialization))]
    UnsupportedMaterialization {
        model: String,
        compute: String,
        materialization: MaterializationType,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Plugin(#[from] PluginError),
}
