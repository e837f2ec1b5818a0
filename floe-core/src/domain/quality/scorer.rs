// floe-core/src/domain/quality/scorer.rs

use super::check::{CheckResult, Dimension};
use super::config::{ScoringConfig, ScoringError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    pub model: String,
    pub score: f64,
    /// Signed points each dimension moved the score away from the baseline.
    pub dimension_contributions: BTreeMap<Dimension, f64>,
    pub checks_evaluated: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f64>,
    pub meets_threshold: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub models: BTreeMap<String, QualityScore>,
    pub aggregate_score: f64,
}

/// Model to score together with the `min_score` of its tier gate.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringTarget {
    pub model: String,
    pub min_score: Option<f64>,
}

pub struct QualityScorer {
    config: ScoringConfig,
}

impl QualityScorer {
    pub fn new(config: ScoringConfig) -> Result<Self, ScoringError> {
        config.check()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Scores one model from the results recorded against it.
    ///
    /// Per dimension `d`, `c_d = w_d * Σ(s_i * (2v_i - 1)) / Σ s_i`, so a
    /// dimension can never move the score by more than `w_d` times its cap.
    pub fn score_model(
        &self,
        target: &ScoringTarget,
        results: &[CheckResult],
    ) -> Result<QualityScore, ScoringError> {
        let mut per_dimension: BTreeMap<Dimension, Vec<&CheckResult>> = BTreeMap::new();
        for result in results.iter().filter(|r| r.model == target.model) {
            if !(0.0..=1.0).contains(&result.value) {
                return Err(ScoringError::ResultOutOfRange {
                    model: result.model.clone(),
                    check: result.check.clone(),
                    value: result.value,
                });
            }
            per_dimension.entry(result.dimension).or_default().push(result);
        }

        let calc = &self.config.calculation;
        let mut contributions = BTreeMap::new();
        let mut total_delta = 0.0;
        let mut evaluated = 0;

        for dimension in Dimension::ALL {
            let Some(mut bucket) = per_dimension.remove(&dimension) else {
                continue;
            };
            // Summation order must not depend on input order
            bucket.sort_by(|a, b| compare_results(a, b));

            let mut weighted = 0.0;
            let mut weight_sum = 0.0;
            for result in &bucket {
                let s = self.config.severity_weights.get(result.severity);
                weighted += s * (2.0 * result.value - 1.0);
                weight_sum += s;
            }
            evaluated += bucket.len();

            let c = self.config.dimension_weights.get(dimension) * weighted / weight_sum;
            let delta = if c >= 0.0 {
                c * calc.max_positive_influence
            } else {
                c * calc.max_negative_influence
            };
            contributions.insert(dimension, round2(delta));
            total_delta += delta;
        }

        let score = round2((calc.baseline_score + total_delta).clamp(0.0, 100.0));
        debug!(model = %target.model, score, checks = evaluated, "Model scored");

        Ok(QualityScore {
            model: target.model.clone(),
            score,
            dimension_contributions: contributions,
            checks_evaluated: evaluated,
            min_score: target.min_score,
            meets_threshold: target.min_score.is_none_or(|min| score >= min),
        })
    }

    #[instrument(skip_all, fields(models = targets.len(), results = results.len()))]
    pub fn score_all(
        &self,
        targets: &[ScoringTarget],
        results: &[CheckResult],
    ) -> Result<QualityReport, ScoringError> {
        let mut models = BTreeMap::new();
        for target in targets {
            let score = self.score_model(target, results)?;
            models.insert(target.model.clone(), score);
        }

        let aggregate_score = if models.is_empty() {
            self.config.calculation.baseline_score
        } else {
            let total: f64 = models.values().map(|s| s.score).sum();
            round2(total / models.len() as f64)
        };

        Ok(QualityReport {
            models,
            aggregate_score,
        })
    }
}

fn compare_results(a: &CheckResult, b: &CheckResult) -> Ordering {
    a.check
        .cmp(&b.check)
        .then_with(|| a.column.cmp(&b.column))
        .then_with(|| a.value.total_cmp(&b.value))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::quality::CheckSeverity;

    fn target(model: &str, min_score: Option<f64>) -> ScoringTarget {
        ScoringTarget {
            model: model.into(),
            min_score,
        }
    }

    fn scorer() -> QualityScorer {
        QualityScorer::new(ScoringConfig::default()).unwrap()
    }

    #[test]
    fn test_no_results_scores_baseline() {
        let score = scorer().score_model(&target("m", None), &[]).unwrap();
        assert_eq!(score.score, 70.0);
        assert_eq!(score.checks_evaluated, 0);
        assert!(score.meets_threshold);
    }

    #[test]
    fn test_all_dimensions_passing_reach_the_positive_cap() {
        let results: Vec<CheckResult> = Dimension::ALL
            .iter()
            .map(|d| CheckResult::new("m", d.as_str(), *d, 1.0))
            .collect();
        let score = scorer().score_model(&target("m", Some(95.0)), &results).unwrap();
        assert_eq!(score.score, 100.0);
        assert!(score.meets_threshold);
    }

    #[test]
    fn test_one_failing_dimension_is_capped_by_its_weight() {
        // completeness weight .25, negative cap 50 => at most -12.5
        let results = vec![
            CheckResult::new("m", "nn_id", Dimension::Completeness, 0.0),
            CheckResult::new("m", "nn_email", Dimension::Completeness, 0.0),
        ];
        let score = scorer().score_model(&target("m", Some(60.0)), &results).unwrap();
        assert_eq!(score.score, 57.5);
        assert_eq!(
            score.dimension_contributions[&Dimension::Completeness],
            -12.5
        );
        assert!(!score.meets_threshold);
    }

    #[test]
    fn test_severity_weights_the_mix() {
        // critical pass (3) + warning fail (1): (3 - 1) / 4 = 0.5 of validity
        let results = vec![
            CheckResult::new("m", "a", Dimension::Validity, 1.0),
            CheckResult::new("m", "b", Dimension::Validity, 0.0)
                .with_severity(CheckSeverity::Warning),
        ];
        let score = scorer().score_model(&target("m", None), &results).unwrap();
        // 0.20 * 0.5 * 30 = 3
        assert_eq!(score.score, 73.0);
    }

    #[test]
    fn test_scoring_is_order_independent_and_idempotent() {
        let mut results = vec![
            CheckResult::new("m", "a", Dimension::Accuracy, 0.37),
            CheckResult::new("m", "b", Dimension::Accuracy, 0.91),
            CheckResult::new("m", "c", Dimension::Timeliness, 0.13),
            CheckResult::new("other", "d", Dimension::Accuracy, 0.0),
        ];
        let s = scorer();
        let first = s.score_model(&target("m", None), &results).unwrap();
        results.reverse();
        let second = s.score_model(&target("m", None), &results).unwrap();
        assert_eq!(first.score.to_bits(), second.score.to_bits());
        assert_eq!(first.checks_evaluated, 3);
    }

    #[test]
    fn test_aggregate_is_mean_of_models() {
        let results = vec![CheckResult::new("a", "x", Dimension::Completeness, 1.0)];
        let report = scorer()
            .score_all(&[target("a", None), target("b", None)], &results)
            .unwrap();
        // a = 70 + 7.5, b = 70
        assert_eq!(report.models["a"].score, 77.5);
        assert_eq!(report.aggregate_score, 73.75);
    }

    #[test]
    fn test_out_of_range_result_is_rejected() {
        let results = vec![CheckResult::new("m", "x", Dimension::Validity, 1.5)];
        assert!(matches!(
            scorer().score_model(&target("m", None), &results),
            Err(ScoringError::ResultOutOfRange { .. })
        ));
    }
}
