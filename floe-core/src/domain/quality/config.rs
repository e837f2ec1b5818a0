// floe-core/src/domain/quality/config.rs

use super::check::{CheckSeverity, Dimension};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Invalid {kind} weight '{name}' = {value}: {reason}")]
    #[diagnostic(code(floe::quality::invalid_weight))]
    InvalidWeight {
        kind: &'static str,
        name: String,
        value: f64,
        reason: &'static str,
    },

    #[error("Dimension weights must sum to 1.0 (found {sum})")]
    #[diagnostic(
        code(floe::quality::weight_sum),
        help("Adjust governance.quality_scoring.dimension_weights so they add up to exactly 1.")
    )]
    WeightSum { sum: f64 },

    #[error("Invalid calculation parameter '{field}' = {value}: {reason}")]
    #[diagnostic(code(floe::quality::invalid_calculation))]
    InvalidCalculation {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("Check result '{check}' on model '{model}' has value {value} outside [0, 1]")]
    #[diagnostic(code(floe::quality::result_out_of_range))]
    ResultOutOfRange {
        model: String,
        check: String,
        value: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionWeights {
    pub completeness: f64,
    pub accuracy: f64,
    pub validity: f64,
    pub consistency: f64,
    pub timeliness: f64,
}

impl Default for DimensionWeights {
    fn default() -> Self {
        Self {
            completeness: 0.25,
            accuracy: 0.25,
            validity: 0.20,
            consistency: 0.15,
            timeliness: 0.15,
        }
    }
}

impl DimensionWeights {
    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Completeness => self.completeness,
            Dimension::Accuracy => self.accuracy,
            Dimension::Validity => self.validity,
            Dimension::Consistency => self.consistency,
            Dimension::Timeliness => self.timeliness,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityWeights {
    pub critical: f64,
    pub warning: f64,
    pub info: f64,
}

impl Default for SeverityWeights {
    fn default() -> Self {
        Self {
            critical: 3.0,
            warning: 1.0,
            info: 0.5,
        }
    }
}

impl SeverityWeights {
    pub fn get(&self, severity: CheckSeverity) -> f64 {
        match severity {
            CheckSeverity::Critical => self.critical,
            CheckSeverity::Warning => self.warning,
            CheckSeverity::Info => self.info,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculationParameters {
    pub baseline_score: f64,
    pub max_positive_influence: f64,
    pub max_negative_influence: f64,
}

impl Default for CalculationParameters {
    fn default() -> Self {
        Self {
            baseline_score: 70.0,
            max_positive_influence: 30.0,
            max_negative_influence: 50.0,
        }
    }
}

/// Three-layer scoring configuration (`governance.quality_scoring`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub dimension_weights: DimensionWeights,
    pub severity_weights: SeverityWeights,
    pub calculation: CalculationParameters,
}

impl ScoringConfig {
    /// Checks every layer; the first problem found is returned.
    pub fn check(&self) -> Result<(), ScoringError> {
        let mut sum = 0.0;
        for dimension in Dimension::ALL {
            let value = self.dimension_weights.get(dimension);
            if !value.is_finite() || value < 0.0 {
                return Err(ScoringError::InvalidWeight {
                    kind: "dimension",
                    name: dimension.to_string(),
                    value,
                    reason: "must be a finite number >= 0",
                });
            }
            sum += value;
        }
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ScoringError::WeightSum { sum });
        }

        for severity in [
            CheckSeverity::Critical,
            CheckSeverity::Warning,
            CheckSeverity::Info,
        ] {
            let value = self.severity_weights.get(severity);
            if !value.is_finite() || value <= 0.0 {
                return Err(ScoringError::InvalidWeight {
                    kind: "severity",
                    name: severity.to_string(),
                    value,
                    reason: "must be a finite number > 0",
                });
            }
        }

        let calc = &self.calculation;
        if !(0.0..=100.0).contains(&calc.baseline_score) {
            return Err(ScoringError::InvalidCalculation {
                field: "baseline_score",
                value: calc.baseline_score,
                reason: "must be within [0, 100]",
            });
        }
        for (field, value) in [
            ("max_positive_influence", calc.max_positive_influence),
            ("max_negative_influence", calc.max_negative_influence),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ScoringError::InvalidCalculation {
                    field,
                    value,
                    reason: "must be a finite number >= 0",
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ScoringConfig::default().check().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: ScoringConfig = serde_yaml::from_str(
            "calculation:\n  baseline_score: 60\nseverity_weights:\n  info: 0.25\n",
        )
        .unwrap();
        assert_eq!(config.calculation.baseline_score, 60.0);
        assert_eq!(config.calculation.max_negative_influence, 50.0);
        assert_eq!(config.severity_weights.info, 0.25);
        assert_eq!(config.severity_weights.critical, 3.0);
    }

    #[test]
    fn test_invalid_configurations() {
        let mut config = ScoringConfig::default();
        config.dimension_weights.accuracy = 0.5;
        assert!(matches!(config.check(), Err(ScoringError::WeightSum { .. })));

        let mut config = ScoringConfig::default();
        config.severity_weights.warning = 0.0;
        assert!(matches!(
            config.check(),
            Err(ScoringError::InvalidWeight { kind: "severity", .. })
        ));

        let mut config = ScoringConfig::default();
        config.dimension_weights.timeliness = -0.15;
        config.dimension_weights.completeness = 0.55;
        assert!(matches!(
            config.check(),
            Err(ScoringError::InvalidWeight { kind: "dimension", .. })
        ));

        let mut config = ScoringConfig::default();
        config.calculation.baseline_score = 120.0;
        assert!(matches!(
            config.check(),
            Err(ScoringError::InvalidCalculation { .. })
        ));
    }
}
