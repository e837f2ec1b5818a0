// floe-core/src/domain/governance/validators/naming.rs

use super::PolicyValidator;
use crate::domain::governance::config::{EnforcementLevel, NamingConfig, NamingConvention};
use crate::domain::governance::error::EnforcementError;
use crate::domain::governance::violation::{PolicyType, Violation, ViolationSeverity, codes};
use crate::domain::graph::ModelGraph;
use crate::domain::resolution::ResolvedModel;
use regex::Regex;

const MEDALLION: &str = r"^(bronze|silver|gold)_[a-z][a-z0-9_]*$";
// Kimball accepts both `dim_customer` and `customer_dim`
const KIMBALL: &str = r"^((dim|fact|fct|bridge|agg)_[a-z][a-z0-9_]*|[a-z][a-z0-9_]*_(dim|fact))$";

pub struct NamingValidator {
    convention: NamingConvention,
    patterns: Vec<Regex>,
    /// `None` when naming is not configured or its enforcement is off.
    severity: Option<ViolationSeverity>,
}

impl NamingValidator {
    pub fn new(config: Option<&NamingConfig>) -> Result<Self, EnforcementError> {
        let Some(config) = config else {
            return Ok(Self {
                convention: NamingConvention::default(),
                patterns: Vec::new(),
                severity: None,
            });
        };

        let sources: Vec<&str> = match config.convention() {
            NamingConvention::Medallion => vec![MEDALLION],
            NamingConvention::Kimball => vec![KIMBALL],
            NamingConvention::Custom => config.custom_patterns.iter().map(String::as_str).collect(),
        };
        let patterns = sources
            .into_iter()
            .map(|p| {
                Regex::new(p).map_err(|e| EnforcementError::InvalidPattern {
                    context: "governance.naming".to_string(),
                    pattern: p.to_string(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let severity = match config.enforcement() {
            EnforcementLevel::Off => None,
            EnforcementLevel::Warn => Some(ViolationSeverity::Warning),
            EnforcementLevel::Strict => Some(ViolationSeverity::Error),
        };

        Ok(Self {
            convention: config.convention(),
            patterns,
            severity,
        })
    }

    fn expected(&self) -> String {
        match self.convention {
            NamingConvention::Medallion => "<bronze|silver|gold>_<name>".to_string(),
            NamingConvention::Kimball => "dim_<name>, fact_<name> or <name>_dim".to_string(),
            NamingConvention::Custom => self
                .patterns
                .iter()
                .map(Regex::as_str)
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }

    fn suggestion(&self, model: &ResolvedModel) -> Option<String> {
        let stem = model
            .name
            .to_ascii_lowercase()
            .trim_start_matches(|c: char| !c.is_ascii_alphabetic())
            .to_string();
        match self.convention {
            NamingConvention::Medallion => Some(format!("{}_{}", model.tier, stem)),
            NamingConvention::Kimball => Some(format!("dim_{} or fact_{}", stem, stem)),
            NamingConvention::Custom => None,
        }
    }
}

impl PolicyValidator for NamingValidator {
    fn name(&self) -> &'static str {
        "naming"
    }

    fn policy_type(&self) -> PolicyType {
        PolicyType::Naming
    }

    fn validate(&self, graph: &ModelGraph) -> Result<Vec<Violation>, EnforcementError> {
        let Some(severity) = self.severity else {
            return Ok(Vec::new());
        };

        let violations = graph
            .models()
            .filter(|m| !self.patterns.iter().any(|re| re.is_match(&m.name)))
            .map(|m| {
                let mut v = Violation::new(
                    codes::NAMING_CONVENTION,
                    severity,
                    PolicyType::Naming,
                    &m.name,
                    format!(
                        "Model '{}' does not follow the {:?} naming convention",
                        m.name, self.convention
                    ),
                )
                .with_expected(self.expected())
                .with_actual(&m.name)
                .with_location(m.path.as_deref());
                if let Some(s) = self.suggestion(m) {
                    v = v.with_suggestion(format!("Rename to '{}'", s));
                }
                v
            })
            .collect();
        Ok(violations)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::spec::QualityTier;
    use std::collections::BTreeSet;

    fn graph(names: &[&str]) -> ModelGraph {
        let models = names
            .iter()
            .map(|n| {
                let mut m = ResolvedModel::new(*n, "duckdb");
                m.tier = QualityTier::Silver;
                m
            })
            .collect();
        ModelGraph::new(models, BTreeSet::new())
    }

    fn config(convention: NamingConvention, enforcement: EnforcementLevel) -> NamingConfig {
        NamingConfig {
            convention: Some(convention),
            enforcement: Some(enforcement),
            custom_patterns: Vec::new(),
        }
    }

    #[test]
    fn test_medallion() {
        let v = NamingValidator::new(Some(&config(
            NamingConvention::Medallion,
            EnforcementLevel::Strict,
        )))
        .unwrap();
        let out = v
            .validate(&graph(&["silver_orders", "stg_customers", "gold_Revenue"]))
            .unwrap();
        let names: Vec<&str> = out.iter().map(|v| v.model_name.as_str()).collect();
        assert_eq!(names, vec!["gold_Revenue", "stg_customers"]);
        assert_eq!(out[1].severity, ViolationSeverity::Error);
        assert_eq!(
            out[1].suggestion.as_deref(),
            Some("Rename to 'silver_stg_customers'")
        );
    }

    #[test]
    fn test_kimball_prefix_and_suffix() {
        let v = NamingValidator::new(Some(&config(
            NamingConvention::Kimball,
            EnforcementLevel::Warn,
        )))
        .unwrap();
        let out = v
            .validate(&graph(&["dim_customer", "orders_fact", "fct_sales", "customers"]))
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].model_name, "customers");
        assert_eq!(out[0].severity, ViolationSeverity::Warning);
    }

    #[test]
    fn test_custom_patterns_and_off() {
        let mut cfg = config(NamingConvention::Custom, EnforcementLevel::Strict);
        cfg.custom_patterns = vec!["^stg_".into(), "^mart_".into()];
        let v = NamingValidator::new(Some(&cfg)).unwrap();
        let out = v
            .validate(&graph(&["stg_a", "mart_b", "tmp_c"]))
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].expected.as_deref(), Some("^stg_ | ^mart_"));

        let off = NamingValidator::new(Some(&config(
            NamingConvention::Medallion,
            EnforcementLevel::Off,
        )))
        .unwrap();
        assert!(off.validate(&graph(&["anything"])).unwrap().is_empty());
        let unset = NamingValidator::new(None).unwrap();
        assert!(unset.validate(&graph(&["anything"])).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_custom_regex_is_a_config_error() {
        let mut cfg = config(NamingConvention::Custom, EnforcementLevel::Strict);
        cfg.custom_patterns = vec!["(unclosed".into()];
        assert!(matches!(
            NamingValidator::new(Some(&cfg)),
            Err(EnforcementError::InvalidPattern { .. })
        ));
    }
}
