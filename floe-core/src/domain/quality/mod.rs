// floe-core/src/domain/quality/mod.rs

pub mod check;
pub mod config;
pub mod scorer;

pub use check::{CheckResult, CheckSeverity, Dimension, QualityCheck};
pub use config::{
    CalculationParameters, DimensionWeights, ScoringConfig, ScoringError, SeverityWeights,
};
pub use scorer::{QualityReport, QualityScore, QualityScorer, ScoringTarget};
