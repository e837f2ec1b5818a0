// floe-core/src/domain/resolution/checks.rs

// dbt column tests -> quality checks, merged with the declared checks.

use crate::domain::quality::{CheckSeverity, Dimension, QualityCheck};
use crate::domain::spec::{ColumnTest, QualityCheckSpec, TransformSpec};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Declared checks first, then the ones inferred from column tests,
/// deduplicated on `(column, check_type)`.
pub fn checks_for_transform(transform: &TransformSpec) -> Vec<QualityCheck> {
    let declared = transform.quality_checks.iter().map(from_declared);
    let inferred = transform.columns.iter().flat_map(|column| {
        column
            .tests
            .iter()
            .filter_map(move |test| from_column_test(&transform.name, &column.name, test))
    });
    dedup_checks(declared.chain(inferred))
}

fn from_declared(spec: &QualityCheckSpec) -> QualityCheck {
    QualityCheck {
        name: spec.name.clone(),
        check_type: spec.check_type.clone(),
        column: spec.column.clone(),
        dimension: spec
            .dimension
            .unwrap_or_else(|| Dimension::for_test(&spec.check_type)),
        severity: spec.severity,
        parameters: spec.parameters.clone(),
    }
}

/// `not_null` or `accepted_values: {values: [..], severity: warn}`.
/// dbt also accepts the severity under `config:`.
pub fn from_column_test(model: &str, column: &str, test: &ColumnTest) -> Option<QualityCheck> {
    let test_type = test.name()?;
    let mut parameters: BTreeMap<String, Value> = test
        .arguments()
        .map(|args| args.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default();

    let mut severity = parameters.remove("severity");
    if let Some(Value::Object(mut config)) = parameters.remove("config") {
        severity = severity.or_else(|| config.remove("severity"));
        if !config.is_empty() {
            parameters.insert("config".to_string(), Value::Object(config));
        }
    }

    let base = test_type.rsplit('.').next().unwrap_or(test_type);
    Some(QualityCheck {
        name: format!("{}_{}_{}", base, model, column),
        check_type: test_type.to_string(),
        column: Some(column.to_string()),
        dimension: Dimension::for_test(test_type),
        severity: CheckSeverity::from_dbt(severity.as_ref().and_then(Value::as_str)),
        parameters,
    })
}

/// Merges duplicates to the strictest severity and the union of their
/// parameters. On conflicting keys the first writer wins. First-seen order
/// is preserved.
pub fn dedup_checks(checks: impl IntoIterator<Item = QualityCheck>) -> Vec<QualityCheck> {
    let mut merged: Vec<QualityCheck> = Vec::new();
    let mut index: BTreeMap<(Option<String>, String), usize> = BTreeMap::new();

    for check in checks {
        let key = (check.column.clone(), check.check_type.clone());
        match index.get(&key) {
            Some(&i) => {
                let existing = &mut merged[i];
                debug!(check = %check.name, kept = %existing.name, "Merging duplicate quality check");
                existing.severity = existing.severity.strictest(check.severity);
                for (k, v) in check.parameters {
                    existing.parameters.entry(k).or_insert(v);
                }
            }
            None => {
                index.insert(key, merged.len());
                merged.push(check);
            }
        }
    }
    merged
}
