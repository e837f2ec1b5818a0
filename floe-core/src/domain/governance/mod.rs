// floe-core/src/domain/governance/mod.rs

pub mod config;
pub mod enforcer;
pub mod error;
pub mod overrides;
pub mod pattern;
pub mod result;
pub mod validators;
pub mod violation;

// Re-exports
pub use config::{
    CustomRule, DEFAULT_PLACEHOLDERS, DocumentationConfig, EnforcementLevel, GovernanceConfig,
    NamingConfig, NamingConvention, QualityGates, RbacConfig, SecretScanningConfig, TierGate,
};
pub use enforcer::{EnforcementOptions, PolicyEnforcer};
pub use error::EnforcementError;
pub use overrides::{OverrideAction, OverrideSet, PolicyOverride};
pub use pattern::glob_to_regex;
pub use result::{EnforcementResult, EnforcementState, EnforcementSummary};
pub use validators::PolicyValidator;
pub use violation::{
    DOCS_BASE_URL, PolicyType, Violation, ViolationLocation, ViolationSeverity, codes,
};
