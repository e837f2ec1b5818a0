// floe-core/src/domain/governance/validators/mod.rs

pub mod coverage;
pub mod custom;
pub mod documentation;
pub mod naming;
pub mod semantic;

pub use coverage::CoverageValidator;
pub use custom::CustomRuleValidator;
pub use documentation::DocumentationValidator;
pub use naming::NamingValidator;
pub use semantic::SemanticValidator;

use super::error::EnforcementError;
use super::violation::{PolicyType, Violation};
use crate::domain::graph::ModelGraph;

/// One independent contribution to the violation list. Validators must not
/// fail on data problems (those are violations); `Err` is reserved for
/// configuration faults discovered while running.
pub trait PolicyValidator: Send + Sync {
    fn name(&self) -> &'static str;

    fn policy_type(&self) -> PolicyType;

    fn validate(&self, graph: &ModelGraph) -> Result<Vec<Violation>, EnforcementError>;
}

/// Base name of a test or check type (`dbt_utils.unique_combination` ->
/// `unique_combination`).
pub(crate) fn base_test_name(test: &str) -> &str {
    test.rsplit('.').next().unwrap_or(test)
}
