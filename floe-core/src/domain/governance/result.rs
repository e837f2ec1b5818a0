// floe-core/src/domain/governance/result.rs

use super::config::EnforcementLevel;
use super::violation::{PolicyType, Violation, ViolationSeverity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle of one enforcement run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnforcementState {
    Pending,
    Running,
    Passed,
    Failed,
}

impl EnforcementState {
    pub fn can_transition_to(&self, next: &EnforcementState) -> bool {
        match (self, next) {
            (Self::Pending, Self::Running) => true,
            (Self::Running, Self::Passed) | (Self::Running, Self::Failed) => true,
            // Terminal states never move, there is no retry
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Passed | Self::Failed)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforcementSummary {
    pub passed: bool,
    pub enforcement_level: EnforcementLevel,
    pub total_violations: usize,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub by_policy_type: BTreeMap<PolicyType, usize>,
    pub models_validated: usize,
    pub models_with_violations: usize,
}

impl EnforcementSummary {
    fn derive(
        violations: &[Violation],
        enforcement_level: EnforcementLevel,
        models_validated: usize,
    ) -> Self {
        let mut summary = Self {
            enforcement_level,
            models_validated,
            total_violations: violations.len(),
            ..Default::default()
        };
        let mut models = std::collections::BTreeSet::new();
        for v in violations {
            match v.severity {
                ViolationSeverity::Error => summary.errors += 1,
                ViolationSeverity::Warning => summary.warnings += 1,
                ViolationSeverity::Info => summary.infos += 1,
            }
            *summary.by_policy_type.entry(v.policy_type).or_insert(0) += 1;
            models.insert(v.model_name.as_str());
        }
        summary.models_with_violations = models.len();
        summary.passed = summary.errors == 0;
        summary
    }
}

/// Outcome of one enforcement run. `summary` and `state` are always derived
/// from the violation list; there is no way to set them directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EnforcementResultRecord")]
pub struct EnforcementResult {
    violations: Vec<Violation>,
    enforcement_level: EnforcementLevel,
    models_validated: usize,
    duration_ms: u64,
    summary: EnforcementSummary,
    state: EnforcementState,
}

// Wire shape accepted on deserialization; derived fields are ignored and
// recomputed.
#[derive(Deserialize)]
struct EnforcementResultRecord {
    #[serde(default)]
    violations: Vec<Violation>,
    #[serde(default)]
    enforcement_level: EnforcementLevel,
    #[serde(default)]
    models_validated: usize,
    #[serde(default)]
    duration_ms: u64,
}

impl From<EnforcementResultRecord> for EnforcementResult {
    fn from(record: EnforcementResultRecord) -> Self {
        Self::new(
            record.violations,
            record.enforcement_level,
            record.models_validated,
            record.duration_ms,
        )
    }
}

impl EnforcementResult {
    pub fn new(
        violations: Vec<Violation>,
        enforcement_level: EnforcementLevel,
        models_validated: usize,
        duration_ms: u64,
    ) -> Self {
        let summary = EnforcementSummary::derive(&violations, enforcement_level, models_validated);
        let state = if summary.passed {
            EnforcementState::Passed
        } else {
            EnforcementState::Failed
        };
        Self {
            violations,
            enforcement_level,
            models_validated,
            duration_ms,
            summary,
            state,
        }
    }

    /// `true` iff no violation has severity `error`.
    pub fn passed(&self) -> bool {
        self.summary.passed
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn summary(&self) -> &EnforcementSummary {
        &self.summary
    }

    pub fn state(&self) -> EnforcementState {
        self.state
    }

    pub fn enforcement_level(&self) -> EnforcementLevel {
        self.enforcement_level
    }

    pub fn models_validated(&self) -> usize {
        self.models_validated
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn error_count(&self) -> usize {
        self.summary.errors
    }

    /// Grouping computed on every call so it can never drift from the list.
    pub fn violations_by_model(&self) -> BTreeMap<&str, Vec<&Violation>> {
        let mut grouped: BTreeMap<&str, Vec<&Violation>> = BTreeMap::new();
        for v in &self.violations {
            grouped.entry(v.model_name.as_str()).or_default().push(v);
        }
        grouped
    }

    /// New result keeping only the violations matching `keep`.
    pub fn filtered(&self, keep: impl Fn(&Violation) -> bool) -> Self {
        Self::new(
            self.violations.iter().filter(|v| keep(v)).cloned().collect(),
            self.enforcement_level,
            self.models_validated,
            self.duration_ms,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::governance::violation::codes;

    fn v(code: &str, severity: ViolationSeverity, model: &str) -> Violation {
        Violation::new(code, severity, PolicyType::Custom, model, "m")
    }

    #[test]
    fn test_passed_iff_no_error() {
        let ok = EnforcementResult::new(
            vec![
                v(codes::REQUIRED_TAGS, ViolationSeverity::Warning, "a"),
                v(codes::REQUIRED_TAGS, ViolationSeverity::Info, "b"),
            ],
            EnforcementLevel::Strict,
            2,
            0,
        );
        assert!(ok.passed());
        assert_eq!(ok.state(), EnforcementState::Passed);

        let failed = EnforcementResult::new(
            vec![v(codes::REQUIRED_TAGS, ViolationSeverity::Error, "a")],
            EnforcementLevel::Strict,
            1,
            0,
        );
        assert!(!failed.passed());
        assert_eq!(failed.state(), EnforcementState::Failed);
        assert_eq!(failed.error_count(), 1);

        let empty = EnforcementResult::new(vec![], EnforcementLevel::Warn, 0, 0);
        assert!(empty.passed());
    }

    #[test]
    fn test_by_model_tracks_filtering() {
        let result = EnforcementResult::new(
            vec![
                v(codes::REQUIRED_TAGS, ViolationSeverity::Error, "a"),
                v(codes::REQUIRED_META_FIELD, ViolationSeverity::Warning, "a"),
                v(codes::REQUIRED_TAGS, ViolationSeverity::Error, "b"),
            ],
            EnforcementLevel::Strict,
            2,
            3,
        );
        assert_eq!(result.violations_by_model()["a"].len(), 2);

        let filtered = result.filtered(|v| v.error_code != codes::REQUIRED_TAGS);
        let grouped = filtered.violations_by_model();
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped["a"].len(), 1);
        assert!(filtered.passed());
    }

    #[test]
    fn test_deserialization_recomputes_derived_fields() {
        let json = r#"{
            "violations": [{
                "error_code": "FLOE-E400", "severity": "error", "policy_type": "custom",
                "model_name": "a", "message": "m",
                "documentation_url": "https://floe.dev/docs/errors/floe-e400"
            }],
            "enforcement_level": "strict",
            "models_validated": 1,
            "duration_ms": 4,
            "summary": { "passed": true },
            "state": "passed"
        }"#;
        let result: EnforcementResult = serde_json::from_str(json).unwrap();
        assert!(!result.passed());
        assert_eq!(result.state(), EnforcementState::Failed);
        assert_eq!(result.summary().errors, 1);
    }

    #[test]
    fn test_state_transitions() {
        use EnforcementState::*;
        assert!(Pending.can_transition_to(&Running));
        assert!(Running.can_transition_to(&Failed));
        assert!(!Pending.can_transition_to(&Passed));
        assert!(!Passed.can_transition_to(&Running));
        assert!(Failed.is_terminal());
    }
}
