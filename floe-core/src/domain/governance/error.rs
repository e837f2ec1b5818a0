// floe-core/src/domain/governance/error.rs

use super::result::EnforcementState;
use miette::Diagnostic;
use thiserror::Error;

/// Configuration faults. Policy breaches are never errors, they are
/// `Violation`s.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum EnforcementError {
    #[error("Invalid pattern '{pattern}' in {context}: {reason}")]
    #[diagnostic(
        code(floe::enforcement::invalid_pattern),
        help("Patterns are Rust regular expressions; model globs only support '*' and '?'.")
    )]
    InvalidPattern {
        context: String,
        pattern: String,
        reason: String,
    },

    #[error("Invalid policy override #{index}: {reason}")]
    #[diagnostic(
        code(floe::enforcement::invalid_override),
        help("An override needs at least one of error_code, policy_type or pattern.")
    )]
    InvalidOverride { index: usize, reason: String },

    #[error("Validator '{validator}' failed: {reason}")]
    #[diagnostic(code(floe::enforcement::validator_failed))]
    ValidatorFailed { validator: String, reason: String },

    #[error("Illegal enforcement state transition {from:?} -> {to:?}")]
    #[diagnostic(code(floe::enforcement::invalid_transition))]
    InvalidTransition {
        from: EnforcementState,
        to: EnforcementState,
    },
}
