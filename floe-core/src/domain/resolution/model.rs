// floe-core/src/domain/resolution/model.rs

use crate::domain::quality::QualityCheck;
use crate::domain::spec::{MaterializationType, QualityTier};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedColumn {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, Value>,
}

/// One transform after resolution. Read-only from here on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedModel {
    pub name: String,
    pub tier: QualityTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub materialization: MaterializationType,
    /// Compute plugin this model runs on.
    pub compute: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ResolvedColumn>,
    /// Upstream models, sorted and unique.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    /// `source.table` references, sorted and unique.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quality_checks: Vec<QualityCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ResolvedModel {
    /// Bare model, used by tests and graph builders.
    pub fn new(name: impl Into<String>, compute: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tier: QualityTier::default(),
            schema: None,
            materialization: MaterializationType::default(),
            compute: compute.into(),
            description: None,
            tags: Vec::new(),
            meta: BTreeMap::new(),
            columns: Vec::new(),
            depends_on: Vec::new(),
            sources: Vec::new(),
            quality_checks: Vec::new(),
            path: None,
        }
    }

    pub fn depending_on(mut self, deps: &[&str]) -> Self {
        self.depends_on = deps.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Checks attached to `column`.
    pub fn checks_on(&self, column: &str) -> impl Iterator<Item = &QualityCheck> {
        self.quality_checks
            .iter()
            .filter(move |c| c.column.as_deref() == Some(column))
    }
}
