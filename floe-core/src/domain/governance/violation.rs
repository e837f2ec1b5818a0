// floe-core/src/domain/governance/violation.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable error-code taxonomy. Codes are part of the report contract and
/// must never be renumbered.
pub mod codes {
    pub const NAMING_CONVENTION: &str = "FLOE-E201";
    pub const COVERAGE_BELOW_THRESHOLD: &str = "FLOE-E210";
    pub const REQUIRED_TEST_MISSING: &str = "FLOE-E211";
    pub const MODEL_DESCRIPTION_MISSING: &str = "FLOE-E220";
    pub const COLUMN_DESCRIPTION_MISSING: &str = "FLOE-E221";
    pub const PLACEHOLDER_DESCRIPTION: &str = "FLOE-E222";
    pub const UNDEFINED_REFERENCE: &str = "FLOE-E301";
    pub const CIRCULAR_DEPENDENCY: &str = "FLOE-E302";
    pub const UNDEFINED_SOURCE: &str = "FLOE-E303";
    pub const REQUIRED_TAGS: &str = "FLOE-E400";
    pub const REQUIRED_META_FIELD: &str = "FLOE-E401";
    pub const REQUIRED_TEST_TYPE: &str = "FLOE-E402";
    pub const VALIDATOR_CRASHED: &str = "FLOE-E900";

    /// One-line title used for report rule catalogs.
    pub fn title(code: &str) -> &'static str {
        match code {
            NAMING_CONVENTION => "Model name violates naming convention",
            COVERAGE_BELOW_THRESHOLD => "Test coverage below threshold",
            REQUIRED_TEST_MISSING => "Tier-required test missing",
            MODEL_DESCRIPTION_MISSING => "Model description missing",
            COLUMN_DESCRIPTION_MISSING => "Column description missing",
            PLACEHOLDER_DESCRIPTION => "Placeholder description",
            UNDEFINED_REFERENCE => "Reference to undefined model",
            CIRCULAR_DEPENDENCY => "Circular dependency",
            UNDEFINED_SOURCE => "Reference to undefined source",
            REQUIRED_TAGS => "Required tags missing",
            REQUIRED_META_FIELD => "Required meta field missing",
            REQUIRED_TEST_TYPE => "Required test type missing",
            VALIDATOR_CRASHED => "Validator crashed",
            _ => "Policy violation",
        }
    }
}

pub const DOCS_BASE_URL: &str = "https://floe.dev/docs/errors";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationSeverity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for ViolationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        };
        f.write_str(s)
    }
}

/// Which validator produced a violation. The declaration order is the
/// primary merge sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyType {
    Naming,
    Coverage,
    Documentation,
    Semantic,
    Custom,
}

impl PolicyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Naming => "naming",
            Self::Coverage => "coverage",
            Self::Documentation => "documentation",
            Self::Semantic => "semantic",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationLocation {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub error_code: String,
    pub severity: ViolationSeverity,
    pub policy_type: PolicyType,
    pub model_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<ViolationLocation>,
    /// Models downstream of `model_name`; only filled on request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downstream_impact: Option<Vec<String>>,
    pub documentation_url: String,
    /// Reason of the override that changed this violation, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_applied: Option<String>,
}

impl Violation {
    pub fn new(
        error_code: &str,
        severity: ViolationSeverity,
        policy_type: PolicyType,
        model_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error_code: error_code.to_string(),
            severity,
            policy_type,
            model_name: model_name.into(),
            column_name: None,
            message: message.into(),
            expected: None,
            actual: None,
            suggestion: None,
            location: None,
            downstream_impact: None,
            documentation_url: format!("{}/{}", DOCS_BASE_URL, error_code.to_ascii_lowercase()),
            override_applied: None,
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column_name = Some(column.into());
        self
    }

    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn with_actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_location(mut self, file: Option<&str>) -> Self {
        self.location = file.map(|f| ViolationLocation {
            file: f.to_string(),
            line: None,
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == ViolationSeverity::Error
    }

    /// Overrides and the warn level may soften this violation. A crashed
    /// validator left its results missing, so its violation stays as raised.
    pub fn is_waivable(&self) -> bool {
        self.error_code != codes::VALIDATOR_CRASHED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documentation_url_is_derived_from_code() {
        let v = Violation::new(
            codes::REQUIRED_META_FIELD,
            ViolationSeverity::Error,
            PolicyType::Custom,
            "dim_customer",
            "missing owner",
        );
        assert_eq!(v.documentation_url, "https://floe.dev/docs/errors/floe-e401");
        assert!(v.is_error());
    }

    #[test]
    fn test_optional_fields_are_omitted_from_json() {
        let v = Violation::new(
            codes::NAMING_CONVENTION,
            ViolationSeverity::Warning,
            PolicyType::Naming,
            "m",
            "bad name",
        );
        let json = serde_json::to_value(&v).unwrap_or_default();
        assert!(json.get("downstream_impact").is_none());
        assert_eq!(json["policy_type"], "naming");
        assert_eq!(json["severity"], "warning");
    }
}
