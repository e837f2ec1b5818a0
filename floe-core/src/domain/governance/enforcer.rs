// floe-core/src/domain/governance/enforcer.rs

use super::config::{EnforcementLevel, GovernanceConfig};
use super::error::EnforcementError;
use super::overrides::OverrideSet;
use super::result::{EnforcementResult, EnforcementState};
use super::validators::{
    CoverageValidator, CustomRuleValidator, DocumentationValidator, NamingValidator,
    PolicyValidator, SemanticValidator,
};
use super::violation::{Violation, ViolationSeverity, codes};
use crate::domain::graph::ModelGraph;
use chrono::NaiveDate;
use rayon::prelude::*;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;
use tracing::{debug, error, info, instrument};

/// Recorded on every error the warn level turned into a warning.
pub const WARN_LEVEL_REASON: &str = "policy_enforcement_level: warn";

#[derive(Debug, Clone, Copy)]
pub struct EnforcementOptions {
    /// Fill `downstream_impact` on every violation.
    pub include_context: bool,
    /// Reference day for override expiry.
    pub today: NaiveDate,
    /// Run validators on the rayon pool.
    pub parallel: bool,
}

impl EnforcementOptions {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            include_context: false,
            today,
            parallel: true,
        }
    }
}

enum Outcome {
    Violations(Vec<Violation>),
    Failed(EnforcementError),
}

/// Runs the validator battery against a model graph. Built once per
/// governance config: every regex and glob is compiled up front.
pub struct PolicyEnforcer {
    level: EnforcementLevel,
    validators: Vec<Box<dyn PolicyValidator>>,
    overrides: OverrideSet,
}

impl PolicyEnforcer {
    pub fn new(config: &GovernanceConfig) -> Result<Self, EnforcementError> {
        let validators: Vec<Box<dyn PolicyValidator>> = vec![
            Box::new(NamingValidator::new(config.naming.as_ref())?),
            Box::new(CoverageValidator::new(config.quality_gates.as_ref())),
            Box::new(DocumentationValidator::new(config.documentation.as_ref())),
            Box::new(SemanticValidator::new()),
            Box::new(CustomRuleValidator::new(&config.custom_rules)?),
        ];
        Ok(Self {
            level: config.enforcement_level(),
            validators,
            overrides: OverrideSet::compile(&config.policy_overrides)?,
        })
    }

    /// Adds a validator to the battery (extensions, fault injection).
    pub fn with_validator(mut self, validator: Box<dyn PolicyValidator>) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn level(&self) -> EnforcementLevel {
        self.level
    }

    #[instrument(skip_all, fields(models = graph.len(), level = %self.level))]
    pub fn enforce(
        &self,
        graph: &ModelGraph,
        options: &EnforcementOptions,
    ) -> Result<EnforcementResult, EnforcementError> {
        let mut state = EnforcementState::Pending;
        transition(&mut state, EnforcementState::Running)?;
        let started = Instant::now();

        if self.level == EnforcementLevel::Off {
            info!("Policy enforcement is off, skipping validators");
            let result = EnforcementResult::new(Vec::new(), self.level, graph.len(), 0);
            transition(&mut state, result.state())?;
            return Ok(result);
        }

        // 1. Run every validator, isolated from each other
        let outcomes: Vec<Outcome> = if options.parallel {
            self.validators
                .par_iter()
                .map(|v| run_isolated(v.as_ref(), graph))
                .collect()
        } else {
            self.validators
                .iter()
                .map(|v| run_isolated(v.as_ref(), graph))
                .collect()
        };

        let mut violations = Vec::new();
        let mut failure = None;
        for outcome in outcomes {
            match outcome {
                Outcome::Violations(found) => violations.extend(found),
                Outcome::Failed(e) => {
                    error!(error = %e, "Validator reported a configuration fault");
                    failure.get_or_insert(e);
                }
            }
        }
        if let Some(e) = failure {
            return Err(e);
        }

        // 2. Deterministic merge, whatever the completion order
        violations.sort_by(|a, b| {
            a.policy_type
                .cmp(&b.policy_type)
                .then_with(|| a.model_name.cmp(&b.model_name))
                .then_with(|| a.error_code.cmp(&b.error_code))
        });

        // 3. Overrides, then the platform enforcement level
        let mut violations = self.overrides.apply(violations, options.today);
        if self.level == EnforcementLevel::Warn {
            for v in violations
                .iter_mut()
                .filter(|v| v.is_error() && v.is_waivable())
            {
                v.severity = ViolationSeverity::Warning;
                v.override_applied = Some(WARN_LEVEL_REASON.to_string());
            }
        }

        if options.include_context {
            for v in &mut violations {
                if graph.get(&v.model_name).is_some() {
                    v.downstream_impact = Some(graph.downstream_of(&v.model_name));
                }
            }
        }

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let result = EnforcementResult::new(violations, self.level, graph.len(), duration_ms);
        transition(&mut state, result.state())?;

        info!(
            passed = result.passed(),
            errors = result.summary().errors,
            warnings = result.summary().warnings,
            duration_ms,
            "Policy enforcement complete"
        );
        Ok(result)
    }
}

fn transition(
    state: &mut EnforcementState,
    next: EnforcementState,
) -> Result<(), EnforcementError> {
    if !state.can_transition_to(&next) {
        return Err(EnforcementError::InvalidTransition {
            from: *state,
            to: next,
        });
    }
    debug!(from = ?state, to = ?next, "Enforcement state change");
    *state = next;
    Ok(())
}

// A panicking validator must not take its siblings' results down with it.
fn run_isolated(validator: &dyn PolicyValidator, graph: &ModelGraph) -> Outcome {
    match catch_unwind(AssertUnwindSafe(|| validator.validate(graph))) {
        Ok(Ok(found)) => {
            debug!(validator = validator.name(), count = found.len(), "Validator finished");
            Outcome::Violations(found)
        }
        Ok(Err(e)) => Outcome::Failed(e),
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            error!(validator = validator.name(), %reason, "Validator crashed");
            Outcome::Violations(vec![
                Violation::new(
                    codes::VALIDATOR_CRASHED,
                    ViolationSeverity::Error,
                    validator.policy_type(),
                    "*",
                    format!("Validator '{}' crashed: {}", validator.name(), reason),
                )
                .with_suggestion("Report this as a bug; results of this validator are missing"),
            ])
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
