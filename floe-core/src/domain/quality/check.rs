// floe-core/src/domain/quality/check.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Quality dimension a check contributes to. Declaration order is the fixed
/// iteration order used when scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Completeness,
    Accuracy,
    Validity,
    Consistency,
    Timeliness,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Self::Completeness,
        Self::Accuracy,
        Self::Validity,
        Self::Consistency,
        Self::Timeliness,
    ];

    /// Dimension of a dbt test or check type. Namespaced tests
    /// (`dbt_utils.recency`) are matched on their last segment.
    pub fn for_test(test: &str) -> Self {
        let base = test.rsplit('.').next().unwrap_or(test);
        match base {
            "not_null" => Self::Completeness,
            "unique" | "relationships" => Self::Consistency,
            "accepted_values" => Self::Validity,
            "expect_column_values_to_be_between" => Self::Accuracy,
            "recency" | "freshness" => Self::Timeliness,
            _ => Self::Validity,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completeness => "completeness",
            Self::Accuracy => "accuracy",
            Self::Validity => "validity",
            Self::Consistency => "consistency",
            Self::Timeliness => "timeliness",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckSeverity {
    #[default]
    Critical,
    Warning,
    Info,
}

impl CheckSeverity {
    fn rank(&self) -> u8 {
        match self {
            Self::Critical => 3,
            Self::Warning => 2,
            Self::Info => 1,
        }
    }

    pub fn strictest(self, other: Self) -> Self {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }

    /// dbt `severity: warn` maps to warning, everything else stays critical.
    pub fn from_dbt(severity: Option<&str>) -> Self {
        match severity.map(str::to_ascii_lowercase).as_deref() {
            Some("warn") | Some("warning") => Self::Warning,
            _ => Self::Critical,
        }
    }
}

impl fmt::Display for CheckSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
            Self::Info => "info",
        };
        f.write_str(s)
    }
}

/// A resolved quality check attached to a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityCheck {
    pub name: String,
    #[serde(rename = "type")]
    pub check_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub dimension: Dimension,
    pub severity: CheckSeverity,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Value>,
}

/// Outcome of running one check, as reported by the quality plugin.
/// `value` is the pass ratio in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub model: String,
    pub check: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub dimension: Dimension,
    #[serde(default)]
    pub severity: CheckSeverity,
    pub value: f64,
}

impl CheckResult {
    pub fn new(model: &str, check: &str, dimension: Dimension, value: f64) -> Self {
        Self {
            model: model.to_string(),
            check: check.to_string(),
            column: None,
            dimension,
            severity: CheckSeverity::Critical,
            value,
        }
    }

    pub fn with_severity(mut self, severity: CheckSeverity) -> Self {
        self.severity = severity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dbt_test_dimension_mapping() {
        assert_eq!(Dimension::for_test("not_null"), Dimension::Completeness);
        assert_eq!(Dimension::for_test("unique"), Dimension::Consistency);
        assert_eq!(Dimension::for_test("relationships"), Dimension::Consistency);
        assert_eq!(Dimension::for_test("accepted_values"), Dimension::Validity);
        assert_eq!(
            Dimension::for_test("dbt_expectations.expect_column_values_to_be_between"),
            Dimension::Accuracy
        );
        assert_eq!(Dimension::for_test("dbt_utils.recency"), Dimension::Timeliness);
        assert_eq!(Dimension::for_test("freshness"), Dimension::Timeliness);
        assert_eq!(Dimension::for_test("my_custom_test"), Dimension::Validity);
    }

    #[test]
    fn test_strictest_severity() {
        use CheckSeverity::*;
        assert_eq!(Warning.strictest(Critical), Critical);
        assert_eq!(Critical.strictest(Info), Critical);
        assert_eq!(Info.strictest(Warning), Warning);
        assert_eq!(CheckSeverity::from_dbt(Some("warn")), Warning);
        assert_eq!(CheckSeverity::from_dbt(Some("error")), Critical);
        assert_eq!(CheckSeverity::from_dbt(None), Critical);
    }
}
