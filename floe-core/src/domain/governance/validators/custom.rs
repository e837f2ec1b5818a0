// floe-core/src/domain/governance/validators/custom.rs

use super::{PolicyValidator, base_test_name};
use crate::domain::governance::config::CustomRule;
use crate::domain::governance::error::EnforcementError;
use crate::domain::governance::pattern::glob_to_regex;
use crate::domain::governance::violation::{PolicyType, Violation, ViolationSeverity, codes};
use crate::domain::graph::ModelGraph;
use crate::domain::resolution::ResolvedModel;
use regex::Regex;

struct CompiledRule {
    rule: CustomRule,
    applies_to: Option<Regex>,
}

impl CompiledRule {
    fn applies(&self, model: &ResolvedModel) -> bool {
        self.applies_to
            .as_ref()
            .is_none_or(|re| re.is_match(&model.name))
    }
}

pub struct CustomRuleValidator {
    rules: Vec<CompiledRule>,
}

impl CustomRuleValidator {
    pub fn new(rules: &[CustomRule]) -> Result<Self, EnforcementError> {
        let mut compiled = Vec::with_capacity(rules.len());
        for (i, rule) in rules.iter().enumerate() {
            let glob = match rule {
                CustomRule::RequireMetaField { applies_to, .. }
                | CustomRule::RequireTestsOfType { applies_to, .. } => applies_to.as_deref(),
                CustomRule::RequireTagsForPrefix { .. } => None,
            };
            let applies_to = glob
                .map(|g| {
                    glob_to_regex(g).map_err(|e| EnforcementError::InvalidPattern {
                        context: format!("governance.custom_rules[{}].applies_to", i),
                        pattern: g.to_string(),
                        reason: e.to_string(),
                    })
                })
                .transpose()?;
            compiled.push(CompiledRule {
                rule: rule.clone(),
                applies_to,
            });
        }
        Ok(Self { rules: compiled })
    }

    fn evaluate(&self, compiled: &CompiledRule, model: &ResolvedModel) -> Vec<Violation> {
        if !compiled.applies(model) {
            return Vec::new();
        }

        match &compiled.rule {
            CustomRule::RequireTagsForPrefix {
                prefix,
                required_tags,
            } => {
                if !model.name.starts_with(prefix.as_str()) {
                    return Vec::new();
                }
                let missing: Vec<&str> = required_tags
                    .iter()
                    .filter(|t| !model.has_tag(t))
                    .map(String::as_str)
                    .collect();
                if missing.is_empty() {
                    return Vec::new();
                }
                vec![
                    violation(
                        codes::REQUIRED_TAGS,
                        model,
                        format!(
                            "Models prefixed '{}' must be tagged [{}]; '{}' is missing [{}]",
                            prefix,
                            required_tags.join(", "),
                            model.name,
                            missing.join(", ")
                        ),
                    )
                    .with_expected(required_tags.join(", "))
                    .with_actual(model.tags.join(", "))
                    .with_suggestion(format!("Add tags: [{}]", missing.join(", "))),
                ]
            }
            CustomRule::RequireMetaField { field, .. } => {
                let present = model.meta.get(field).is_some_and(|v| !v.is_null());
                if present {
                    return Vec::new();
                }
                vec![
                    violation(
                        codes::REQUIRED_META_FIELD,
                        model,
                        format!("Model '{}' is missing required meta field '{}'", model.name, field),
                    )
                    .with_expected(format!("meta.{}", field))
                    .with_actual("absent")
                    .with_suggestion(format!("Add `meta: {{ {}: ... }}` to the transform", field)),
                ]
            }
            CustomRule::RequireTestsOfType {
                test_types,
                min_count,
                ..
            } => test_types
                .iter()
                .filter_map(|wanted| {
                    let count = model
                        .quality_checks
                        .iter()
                        .filter(|c| base_test_name(&c.check_type) == base_test_name(wanted))
                        .count();
                    (count < *min_count).then(|| {
                        violation(
                            codes::REQUIRED_TEST_TYPE,
                            model,
                            format!(
                                "Model '{}' needs at least {} '{}' test(s), found {}",
                                model.name, min_count, wanted, count
                            ),
                        )
                        .with_expected(format!(">= {} {}", min_count, wanted))
                        .with_actual(count.to_string())
                    })
                })
                .collect(),
        }
    }
}

fn violation(code: &str, model: &ResolvedModel, message: String) -> Violation {
    Violation::new(
        code,
        ViolationSeverity::Error,
        PolicyType::Custom,
        &model.name,
        message,
    )
    .with_location(model.path.as_deref())
}

impl PolicyValidator for CustomRuleValidator {
    fn name(&self) -> &'static str {
        "custom"
    }

    fn policy_type(&self) -> PolicyType {
        PolicyType::Custom
    }

    fn validate(&self, graph: &ModelGraph) -> Result<Vec<Violation>, EnforcementError> {
        let mut out = Vec::new();
        for model in graph.models() {
            for rule in &self.rules {
                out.extend(self.evaluate(rule, model));
            }
        }
        Ok(out)
    }
}
