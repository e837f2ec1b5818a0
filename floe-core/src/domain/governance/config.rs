// floe-core/src/domain/governance/config.rs

// `governance:` block of a manifest. Every setting a child manifest may only
// strengthen is an `Option`, so "not set" and "explicitly weakened" stay
// distinguishable during inheritance.

use super::overrides::PolicyOverride;
use super::pattern::glob_to_regex;
use crate::domain::quality::ScoringConfig;
use crate::domain::spec::{FieldError, QualityTier};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

pub const DEFAULT_PLACEHOLDERS: [&str; 5] = ["tbd", "todo", "fixme", "n/a", "placeholder"];

/// Ordered from weakest to strictest.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EnforcementLevel {
    Off,
    #[default]
    Warn,
    Strict,
}

impl fmt::Display for EnforcementLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Off => "off",
            Self::Warn => "warn",
            Self::Strict => "strict",
        };
        f.write_str(s)
    }
}

impl FromStr for EnforcementLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "warn" => Ok(Self::Warn),
            "strict" => Ok(Self::Strict),
            other => Err(format!(
                "Unknown enforcement level '{}' (expected off, warn or strict)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingConvention {
    #[default]
    Medallion,
    Kimball,
    Custom,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct NamingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub convention: Option<NamingConvention>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforcement: Option<EnforcementLevel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_patterns: Vec<String>,
}

impl NamingConfig {
    pub fn convention(&self) -> NamingConvention {
        self.convention.unwrap_or_default()
    }

    pub fn enforcement(&self) -> EnforcementLevel {
        self.enforcement.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct TierGate {
    #[validate(range(min = 0.0, max = 100.0, message = "must be a percentage in [0, 100]"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_test_coverage: Option<f64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_tests: Vec<String>,

    #[validate(range(min = 0.0, max = 100.0, message = "must be a score in [0, 100]"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct QualityGates {
    /// Platform-wide floor, used for tiers without their own threshold.
    #[validate(range(min = 0.0, max = 100.0, message = "must be a percentage in [0, 100]"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_test_coverage: Option<f64>,

    #[validate(nested)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bronze: Option<TierGate>,

    #[validate(nested)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silver: Option<TierGate>,

    #[validate(nested)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gold: Option<TierGate>,
}

impl QualityGates {
    pub fn gate(&self, tier: QualityTier) -> Option<&TierGate> {
        match tier {
            QualityTier::Bronze => self.bronze.as_ref(),
            QualityTier::Silver => self.silver.as_ref(),
            QualityTier::Gold => self.gold.as_ref(),
        }
    }

    pub fn gate_mut(&mut self, tier: QualityTier) -> &mut Option<TierGate> {
        match tier {
            QualityTier::Bronze => &mut self.bronze,
            QualityTier::Silver => &mut self.silver,
            QualityTier::Gold => &mut self.gold,
        }
    }

    /// Coverage percentage required for `tier` (0 when unset).
    pub fn coverage_threshold(&self, tier: QualityTier) -> f64 {
        self.gate(tier)
            .and_then(|g| g.min_test_coverage)
            .or(self.min_test_coverage)
            .unwrap_or(0.0)
    }

    pub fn required_tests(&self, tier: QualityTier) -> &[String] {
        self.gate(tier)
            .map(|g| g.required_tests.as_slice())
            .unwrap_or_default()
    }

    pub fn min_score(&self, tier: QualityTier) -> Option<f64> {
        self.gate(tier).and_then(|g| g.min_score)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct DocumentationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_model_descriptions: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_column_descriptions: Option<bool>,
    /// Case-insensitive descriptions treated as missing. Defaults to
    /// `DEFAULT_PLACEHOLDERS`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder_patterns: Option<Vec<String>>,
}

impl DocumentationConfig {
    pub fn require_model_descriptions(&self) -> bool {
        self.require_model_descriptions.unwrap_or(false)
    }

    pub fn require_column_descriptions(&self) -> bool {
        self.require_column_descriptions.unwrap_or(false)
    }

    pub fn placeholders(&self) -> Vec<String> {
        match &self.placeholder_patterns {
            Some(patterns) => patterns.clone(),
            None => DEFAULT_PLACEHOLDERS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

fn default_min_count() -> usize {
    1
}

/// User-defined rule evaluated per model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CustomRule {
    /// Models whose name starts with `prefix` must carry every tag.
    RequireTagsForPrefix {
        prefix: String,
        required_tags: Vec<String>,
    },
    /// Models matching `applies_to` (glob, default all) need `meta.<field>`.
    RequireMetaField {
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        applies_to: Option<String>,
    },
    /// Models matching `applies_to` need at least `min_count` checks of
    /// each listed type.
    RequireTestsOfType {
        test_types: Vec<String>,
        #[serde(default = "default_min_count")]
        min_count: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        applies_to: Option<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RbacConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_role: Option<String>,
}

impl RbacConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretScanningConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Extra config keys treated as sensitive on top of the builtin list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sensitive_keys: Vec<String>,
}

impl SecretScanningConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct GovernanceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_enforcement_level: Option<EnforcementLevel>,

    #[validate(nested)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub naming: Option<NamingConfig>,

    #[validate(nested)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_gates: Option<QualityGates>,

    #[validate(nested)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<DocumentationConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_rules: Vec<CustomRule>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policy_overrides: Vec<PolicyOverride>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_scoring: Option<ScoringConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rbac: Option<RbacConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_scanning: Option<SecretScanningConfig>,
}

impl GovernanceConfig {
    pub fn enforcement_level(&self) -> EnforcementLevel {
        self.policy_enforcement_level.unwrap_or_default()
    }

    pub fn scoring(&self) -> ScoringConfig {
        self.quality_scoring.unwrap_or_default()
    }

    pub fn rbac(&self) -> RbacConfig {
        self.rbac.clone().unwrap_or_default()
    }

    pub fn secret_scanning(&self) -> SecretScanningConfig {
        self.secret_scanning.clone().unwrap_or_default()
    }

    /// Semantic checks on top of the derive rules, reported under `prefix`.
    pub fn cross_field_errors(&self, prefix: &str) -> Vec<FieldError> {
        let mut errors = Vec::new();
        let at = |field: String| format!("{}.{}", prefix, field);

        if let Some(naming) = &self.naming {
            if naming.convention() == NamingConvention::Custom && naming.custom_patterns.is_empty()
            {
                errors.push(FieldError::new(
                    at("naming.custom_patterns".into()),
                    "the custom convention needs at least one pattern",
                ));
            }
            for (i, pattern) in naming.custom_patterns.iter().enumerate() {
                if let Err(e) = Regex::new(pattern) {
                    errors.push(FieldError::new(
                        at(format!("naming.custom_patterns[{}]", i)),
                        format!("invalid regex: {}", e),
                    ));
                }
            }
        }

        for (i, rule) in self.custom_rules.iter().enumerate() {
            let path = at(format!("custom_rules[{}]", i));
            match rule {
                CustomRule::RequireTagsForPrefix {
                    prefix,
                    required_tags,
                } => {
                    if prefix.is_empty() {
                        errors.push(FieldError::new(format!("{}.prefix", path), "must not be empty"));
                    }
                    if required_tags.is_empty() {
                        errors.push(FieldError::new(
                            format!("{}.required_tags", path),
                            "must list at least one tag",
                        ));
                    }
                }
                CustomRule::RequireMetaField { field, applies_to } => {
                    if field.is_empty() {
                        errors.push(FieldError::new(format!("{}.field", path), "must not be empty"));
                    }
                    check_glob(&mut errors, &path, applies_to.as_deref());
                }
                CustomRule::RequireTestsOfType {
                    test_types,
                    min_count,
                    applies_to,
                } => {
                    if test_types.is_empty() {
                        errors.push(FieldError::new(
                            format!("{}.test_types", path),
                            "must list at least one test type",
                        ));
                    }
                    if *min_count == 0 {
                        errors.push(FieldError::new(
                            format!("{}.min_count", path),
                            "must be at least 1",
                        ));
                    }
                    check_glob(&mut errors, &path, applies_to.as_deref());
                }
            }
        }

        for (i, rule) in self.policy_overrides.iter().enumerate() {
            let path = at(format!("policy_overrides[{}]", i));
            if !rule.has_matcher() {
                errors.push(FieldError::new(
                    path.clone(),
                    "needs at least one of error_code, policy_type or pattern",
                ));
            }
            if rule.reason.trim().is_empty() {
                errors.push(FieldError::new(
                    format!("{}.reason", path),
                    "an override must document its reason",
                ));
            }
            if let Some(code) = &rule.error_code
                && !is_error_code(code)
            {
                errors.push(FieldError::new(
                    format!("{}.error_code", path),
                    format!("'{}' is not a FLOE-Exxx code", code),
                ));
            }
            if let Some(glob) = &rule.pattern
                && glob_to_regex(glob).is_err()
            {
                errors.push(FieldError::new(
                    format!("{}.pattern", path),
                    "invalid model glob",
                ));
            }
        }

        if let Some(scoring) = &self.quality_scoring
            && let Err(e) = scoring.check()
        {
            errors.push(FieldError::new(at("quality_scoring".into()), e.to_string()));
        }

        errors
    }
}

fn check_glob(errors: &mut Vec<FieldError>, path: &str, glob: Option<&str>) {
    if let Some(glob) = glob
        && glob_to_regex(glob).is_err()
    {
        errors.push(FieldError::new(
            format!("{}.applies_to", path),
            "invalid model glob",
        ));
    }
}

fn is_error_code(code: &str) -> bool {
    code.strip_prefix("FLOE-E")
        .is_some_and(|digits| digits.len() == 3 && digits.chars().all(|c| c.is_ascii_digit()))
}
