// floe-core/src/domain/spec/floe_spec.rs

use super::validation::{FieldError, is_identifier, validate_identifier};
use crate::domain::plugin::{CapabilityKind, PluginConfig};
use crate::domain::quality::{CheckSeverity, Dimension};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use validator::Validate;

pub const API_VERSION: &str = "floe.dev/v1";
pub const SPEC_KIND: &str = "FloeSpec";

/// Medallion layer of a transform.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    #[default]
    Bronze,
    Silver,
    Gold,
}

impl QualityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterializationType {
    #[default]
    View,
    Table,
    Incremental,
    Ephemeral,
}

impl MaterializationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Table => "table",
            Self::Incremental => "incremental",
            Self::Ephemeral => "ephemeral",
        }
    }
}

impl fmt::Display for MaterializationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{ type, config }` entry of a `plugins:` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginSelection {
    #[serde(rename = "type", default)]
    pub plugin_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: PluginConfig,
}

impl PluginSelection {
    pub fn new(plugin_type: impl Into<String>) -> Self {
        Self {
            plugin_type: plugin_type.into(),
            config: PluginConfig::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ProductMetadata {
    #[validate(length(min = 1, message = "product name is required"))]
    #[serde(default)]
    pub name: String,

    #[validate(length(min = 1, message = "product version is required"))]
    #[serde(default)]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// Declared target for `source('name', 'table')` references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SourceDeclaration {
    #[validate(length(min = 1, message = "source name is required"))]
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub tables: Vec<String>,
}

impl SourceDeclaration {
    pub fn qualified_tables(&self) -> impl Iterator<Item = String> + '_ {
        self.tables.iter().map(|t| format!("{}.{}", self.name, t))
    }
}

/// dbt-style column test: either `not_null` or `accepted_values: {...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnTest {
    Name(String),
    Configured(BTreeMap<String, Value>),
}

impl ColumnTest {
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Configured(map) if map.len() == 1 => map.keys().next().map(String::as_str),
            Self::Configured(_) => None,
        }
    }

    /// Arguments of a configured test (`values`, `severity`, ...).
    pub fn arguments(&self) -> Option<&serde_json::Map<String, Value>> {
        match self {
            Self::Name(_) => None,
            Self::Configured(map) => map.values().next().and_then(Value::as_object),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ColumnSpec {
    #[validate(length(min = 1, message = "column name is required"))]
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub tests: Vec<ColumnTest>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct QualityCheckSpec {
    #[validate(length(min = 1, message = "check name is required"))]
    #[serde(default)]
    pub name: String,

    #[validate(length(min = 1, message = "check type is required"))]
    #[serde(rename = "type", default)]
    pub check_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,

    /// Inferred from the check type when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<Dimension>,

    #[serde(default)]
    pub severity: CheckSeverity,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TransformSpec {
    #[validate(length(min = 1, message = "transform name is required"))]
    #[validate(custom(function = "validate_identifier"))]
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub tier: QualityTier,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub materialization: Option<MaterializationType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, Value>,

    #[serde(default)]
    pub depends_on: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,

    /// Source file of the model, used for report locations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[validate(nested)]
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,

    #[validate(nested)]
    #[serde(default)]
    pub quality_checks: Vec<QualityCheckSpec>,
}

impl TransformSpec {
    /// Minimal transform, mostly for tests and programmatic specs.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tier: QualityTier::default(),
            compute: None,
            materialization: None,
            schema: None,
            description: None,
            tags: Vec::new(),
            meta: BTreeMap::new(),
            depends_on: Vec::new(),
            sql: None,
            path: None,
            columns: Vec::new(),
            quality_checks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FloeSpec {
    #[serde(rename = "apiVersion", default)]
    pub api_version: String,

    #[serde(default)]
    pub kind: String,

    #[validate(nested)]
    #[serde(default)]
    pub metadata: ProductMetadata,

    /// Spec-level plugin overrides.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub plugins: BTreeMap<CapabilityKind, PluginSelection>,

    #[validate(nested)]
    #[serde(default)]
    pub sources: Vec<SourceDeclaration>,

    #[validate(length(min = 1, message = "at least one transform is required"))]
    #[validate(nested)]
    #[serde(default)]
    pub transforms: Vec<TransformSpec>,
}

impl FloeSpec {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: SPEC_KIND.to_string(),
            metadata: ProductMetadata {
                name: name.into(),
                version: version.into(),
                ..Default::default()
            },
            plugins: BTreeMap::new(),
            sources: Vec::new(),
            transforms: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: TransformSpec) -> Self {
        self.transforms.push(transform);
        self
    }

    pub fn transform(&self, name: &str) -> Option<&TransformSpec> {
        self.transforms.iter().find(|t| t.name == name)
    }

    /// `source.table` keys declared under `sources:`.
    pub fn declared_sources(&self) -> BTreeSet<String> {
        self.sources
            .iter()
            .flat_map(SourceDeclaration::qualified_tables)
            .collect()
    }

    /// Checks the derive-based validation can't express.
    pub fn cross_field_errors(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.api_version != API_VERSION {
            errors.push(FieldError::new(
                "apiVersion",
                format!("expected '{}', found '{}'", API_VERSION, self.api_version),
            ));
        }
        if self.kind != SPEC_KIND {
            errors.push(FieldError::new(
                "kind",
                format!("expected '{}', found '{}'", SPEC_KIND, self.kind),
            ));
        }

        for (capability, selection) in &self.plugins {
            if selection.plugin_type.trim().is_empty() {
                errors.push(FieldError::new(
                    format!("plugins.{}.type", capability),
                    "plugin type is required",
                ));
            }
        }

        let mut seen = BTreeSet::new();
        for (i, transform) in self.transforms.iter().enumerate() {
            if !transform.name.is_empty() && !seen.insert(transform.name.as_str()) {
                errors.push(FieldError::new(
                    format!("transforms[{}].name", i),
                    format!("duplicate transform name '{}'", transform.name),
                ));
            }

            for (j, dep) in transform.depends_on.iter().enumerate() {
                if !is_identifier(dep) {
                    errors.push(FieldError::new(
                        format!("transforms[{}].depends_on[{}]", i, j),
                        format!("'{}' is not a valid model name", dep),
                    ));
                }
            }

            let mut columns = BTreeSet::new();
            for (j, column) in transform.columns.iter().enumerate() {
                if !column.name.is_empty() && !columns.insert(column.name.as_str()) {
                    errors.push(FieldError::new(
                        format!("transforms[{}].columns[{}].name", i, j),
                        format!("duplicate column name '{}'", column.name),
                    ));
                }
                for (k, test) in column.tests.iter().enumerate() {
                    if test.name().is_none() {
                        errors.push(FieldError::new(
                            format!("transforms[{}].columns[{}].tests[{}]", i, j, k),
                            "a configured test must be a map with exactly one key",
                        ));
                    }
                }
            }
        }

        errors
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SPEC: &str = r#"
apiVersion: floe.dev/v1
kind: FloeSpec
metadata:
  name: customer-360
  version: 1.0.0
transforms:
  - name: stg_customers
    columns:
      - name: id
        tests:
          - not_null
          - accepted_values:
              values: [a, b]
              severity: warn
"#;

    #[test]
    fn test_parse_defaults() {
        let spec: FloeSpec = serde_yaml::from_str(SPEC).unwrap();
        let t = &spec.transforms[0];
        assert_eq!(t.tier, QualityTier::Bronze);
        assert_eq!(t.materialization, None);
        assert!(spec.validate().is_ok());
        assert!(spec.cross_field_errors().is_empty());
    }

    #[test]
    fn test_column_test_forms() {
        let spec: FloeSpec = serde_yaml::from_str(SPEC).unwrap();
        let tests = &spec.transforms[0].columns[0].tests;
        assert_eq!(tests[0].name(), Some("not_null"));
        assert!(tests[0].arguments().is_none());
        assert_eq!(tests[1].name(), Some("accepted_values"));
        let args = tests[1].arguments().unwrap();
        assert_eq!(args.get("severity").and_then(Value::as_str), Some("warn"));
    }

    #[test]
    fn test_cross_field_errors_are_all_reported() {
        let mut spec: FloeSpec = serde_yaml::from_str(SPEC).unwrap();
        spec.kind = "Manifest".into();
        spec.transforms.push(TransformSpec::named("stg_customers"));
        spec.transforms[1].depends_on.push("not valid".into());

        let paths: Vec<String> = spec
            .cross_field_errors()
            .into_iter()
            .map(|e| e.path)
            .collect();
        assert_eq!(
            paths,
            vec![
                "kind",
                "transforms[1].name",
                "transforms[1].depends_on[0]"
            ]
        );
    }

    #[test]
    fn test_declared_sources_are_qualified() {
        let mut spec = FloeSpec::new("p", "1");
        spec.sources.push(SourceDeclaration {
            name: "raw".into(),
            tables: vec!["orders".into(), "customers".into()],
        });
        let sources: Vec<String> = spec.declared_sources().into_iter().collect();
        assert_eq!(sources, vec!["raw.customers", "raw.orders"]);
    }
}
