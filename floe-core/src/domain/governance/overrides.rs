// floe-core/src/domain/governance/overrides.rs

use super::error::EnforcementError;
use super::pattern::glob_to_regex;
use super::violation::{PolicyType, Violation, ViolationSeverity};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideAction {
    /// error -> warning. Never touches anything that is not an error.
    Downgrade,
    /// Drop the violation.
    Exclude,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_type: Option<PolicyType>,
    /// Model-name glob.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    pub action: OverrideAction,
    #[serde(default)]
    pub reason: String,
    /// Last day (inclusive) the override applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<NaiveDate>,
}

impl PolicyOverride {
    pub fn for_code(code: &str, action: OverrideAction, reason: &str) -> Self {
        Self {
            error_code: Some(code.to_string()),
            policy_type: None,
            pattern: None,
            action,
            reason: reason.to_string(),
            expiration_date: None,
        }
    }

    pub fn expiring(mut self, date: NaiveDate) -> Self {
        self.expiration_date = Some(date);
        self
    }

    pub fn is_active(&self, today: NaiveDate) -> bool {
        self.expiration_date.is_none_or(|last_day| today <= last_day)
    }

    pub fn has_matcher(&self) -> bool {
        self.error_code.is_some() || self.policy_type.is_some() || self.pattern.is_some()
    }
}

struct CompiledOverride {
    rule: PolicyOverride,
    model_glob: Option<Regex>,
}

impl CompiledOverride {
    fn matches(&self, violation: &Violation) -> bool {
        self.rule
            .error_code
            .as_deref()
            .is_none_or(|code| code == violation.error_code)
            && self
                .rule
                .policy_type
                .is_none_or(|pt| pt == violation.policy_type)
            && self
                .model_glob
                .as_ref()
                .is_none_or(|re| re.is_match(&violation.model_name))
    }
}

/// Ordered override rules. The first active matching rule decides.
#[derive(Default)]
pub struct OverrideSet {
    rules: Vec<CompiledOverride>,
}

impl OverrideSet {
    pub fn compile(rules: &[PolicyOverride]) -> Result<Self, EnforcementError> {
        let mut compiled = Vec::with_capacity(rules.len());
        for (index, rule) in rules.iter().enumerate() {
            if !rule.has_matcher() {
                return Err(EnforcementError::InvalidOverride {
                    index,
                    reason: "no matcher configured".to_string(),
                });
            }
            let model_glob = match &rule.pattern {
                Some(glob) => Some(glob_to_regex(glob).map_err(|e| {
                    EnforcementError::InvalidPattern {
                        context: format!("policy_overrides[{}].pattern", index),
                        pattern: glob.clone(),
                        reason: e.to_string(),
                    }
                })?),
                None => None,
            };
            compiled.push(CompiledOverride {
                rule: rule.clone(),
                model_glob,
            });
        }
        Ok(Self { rules: compiled })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Pure map/filter over `violations`. Applying the same set twice is a
    /// no-op the second time; expired rules behave as if absent.
    pub fn apply(&self, violations: Vec<Violation>, today: NaiveDate) -> Vec<Violation> {
        let active: Vec<&CompiledOverride> = self
            .rules
            .iter()
            .filter(|o| {
                let live = o.rule.is_active(today);
                if !live {
                    warn!(
                        code = ?o.rule.error_code,
                        expired = ?o.rule.expiration_date,
                        "Ignoring expired policy override"
                    );
                }
                live
            })
            .collect();

        violations
            .into_iter()
            .filter_map(|violation| {
                if !violation.is_waivable() {
                    return Some(violation);
                }
                let Some(rule) = active.iter().find(|o| o.matches(&violation)) else {
                    return Some(violation);
                };
                match rule.rule.action {
                    OverrideAction::Exclude => {
                        debug!(code = %violation.error_code, model = %violation.model_name, "Violation excluded by override");
                        None
                    }
                    OverrideAction::Downgrade if violation.is_error() => {
                        debug!(code = %violation.error_code, model = %violation.model_name, "Violation downgraded by override");
                        Some(Violation {
                            severity: ViolationSeverity::Warning,
                            override_applied: Some(rule.rule.reason.clone()),
                            ..violation
                        })
                    }
                    OverrideAction::Downgrade => Some(violation),
                }
            })
            .collect()
    }
}
