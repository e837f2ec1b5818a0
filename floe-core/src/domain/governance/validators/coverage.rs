// floe-core/src/domain/governance/validators/coverage.rs

use super::{PolicyValidator, base_test_name};
use crate::domain::governance::config::QualityGates;
use crate::domain::governance::error::EnforcementError;
use crate::domain::governance::violation::{PolicyType, Violation, ViolationSeverity, codes};
use crate::domain::graph::ModelGraph;
use crate::domain::resolution::ResolvedModel;

pub struct CoverageValidator {
    gates: Option<QualityGates>,
}

impl CoverageValidator {
    pub fn new(gates: Option<&QualityGates>) -> Self {
        Self {
            gates: gates.cloned(),
        }
    }

    /// Percentage of columns with at least one check. A model without
    /// declared columns is fully covered by any model-level check.
    pub fn coverage(model: &ResolvedModel) -> f64 {
        if model.columns.is_empty() {
            return if model.quality_checks.is_empty() {
                0.0
            } else {
                100.0
            };
        }
        let tested = model
            .columns
            .iter()
            .filter(|c| model.checks_on(&c.name).next().is_some())
            .count();
        tested as f64 * 100.0 / model.columns.len() as f64
    }

    fn check_model(&self, gates: &QualityGates, model: &ResolvedModel) -> Vec<Violation> {
        let mut out = Vec::new();

        let threshold = gates.coverage_threshold(model.tier);
        if threshold > 0.0 {
            let coverage = Self::coverage(model);
            if coverage < threshold {
                let untested: Vec<&str> = model
                    .columns
                    .iter()
                    .filter(|c| model.checks_on(&c.name).next().is_none())
                    .map(|c| c.name.as_str())
                    .collect();
                let suggestion = if untested.is_empty() {
                    "Add at least one quality check or column test".to_string()
                } else {
                    format!("Add tests to columns: {}", untested.join(", "))
                };
                out.push(
                    Violation::new(
                        codes::COVERAGE_BELOW_THRESHOLD,
                        ViolationSeverity::Error,
                        PolicyType::Coverage,
                        &model.name,
                        format!(
                            "Test coverage {:.1}% is below the {:.1}% required for {} models (shortfall {:.1}%)",
                            coverage,
                            threshold,
                            model.tier,
                            threshold - coverage
                        ),
                    )
                    .with_expected(format!(">= {:.1}%", threshold))
                    .with_actual(format!("{:.1}%", coverage))
                    .with_suggestion(suggestion)
                    .with_location(model.path.as_deref()),
                );
            }
        }

        for required in gates.required_tests(model.tier) {
            let present = model
                .quality_checks
                .iter()
                .any(|c| base_test_name(&c.check_type) == base_test_name(required));
            if !present {
                out.push(
                    Violation::new(
                        codes::REQUIRED_TEST_MISSING,
                        ViolationSeverity::Error,
                        PolicyType::Coverage,
                        &model.name,
                        format!(
                            "{} models require a '{}' test; none found on '{}'",
                            model.tier, required, model.name
                        ),
                    )
                    .with_expected(required.clone())
                    .with_actual("absent")
                    .with_suggestion(format!("Add a '{}' test to a key column", required))
                    .with_location(model.path.as_deref()),
                );
            }
        }

        out
    }
}

impl PolicyValidator for CoverageValidator {
    fn name(&self) -> &'static str {
        "coverage"
    }

    fn policy_type(&self) -> PolicyType {
        PolicyType::Coverage
    }

    fn validate(&self, graph: &ModelGraph) -> Result<Vec<Violation>, EnforcementError> {
        let Some(gates) = &self.gates else {
            return Ok(Vec::new());
        };
        Ok(graph
            .models()
            .flat_map(|m| self.check_model(gates, m))
            .collect())
    }
}
