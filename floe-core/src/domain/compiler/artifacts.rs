// floe-core/src/domain/compiler/artifacts.rs

use super::digest::{canonical_bytes, sha256_digest};
use crate::domain::error::DomainError;
use crate::domain::governance::{EnforcementSummary, QualityGates};
use crate::domain::plugin::{CapabilityKind, CatalogConnection, PluginConfig};
use crate::domain::quality::{QualityCheck, QualityScore, ScoringConfig};
use crate::domain::resolution::{ResolvedModel, ResolvedPlugin};
use crate::domain::spec::DeploymentMode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Schema version of [`CompiledArtifacts`]. MAJOR for removals or type
/// changes, MINOR for new optional fields, PATCH for metadata only.
pub const COMPILED_ARTIFACTS_VERSION: &str = "1.0.0";

pub const COMPILED_ARTIFACTS_MEDIA_TYPE: &str = "application/vnd.floe.compiled-artifacts.v1+json";

pub const FLOE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub product_name: String,
    pub product_version: String,
    pub floe_version: String,
    /// Digest of the spec and manifest chain the artifacts were built from.
    pub source_hash: String,
    /// Only set when the caller pins a timestamp (SOURCE_DATE_EPOCH).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiled_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductIdentity {
    /// `domain.product`, or the bare product name without a domain.
    pub product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiled_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledTransforms {
    pub models: Vec<ResolvedModel>,
    /// Layers of models that can run together, in order.
    pub execution_plan: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Quality plugin in effect, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    pub scoring: ScoringConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gates: Option<QualityGates>,
    /// Deduplicated checks per model.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub checks: BTreeMap<String, Vec<QualityCheck>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageConfig {
    pub backend: String,
    pub namespace: String,
    pub transport: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionConfig {
    pub plugin: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: PluginConfig,
}

/// Terminal output of a compile run. Never edited once digested: a new
/// compile produces a new document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledArtifacts {
    pub version: String,
    pub metadata: ArtifactMetadata,
    pub identity: ProductIdentity,
    pub mode: DeploymentMode,
    pub inheritance_chain: Vec<String>,
    pub plugins: BTreeMap<CapabilityKind, ResolvedPlugin>,
    pub transforms: CompiledTransforms,
    pub dbt_profiles: Value,
    pub quality_config: QualityConfig,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub quality_scores: BTreeMap<String, QualityScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate_quality_score: Option<f64>,
    /// Counts only; the full violation list goes to the exporters.
    pub enforcement_result: EnforcementSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<CatalogConnection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineage_backend: Option<LineageConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingestion: Option<IngestionConfig>,
}

impl CompiledArtifacts {
    /// Compact JSON with sorted keys. Identical documents give identical bytes.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, DomainError> {
        canonical_bytes(self)
    }

    /// `sha256:<hex>` over [`Self::canonical_bytes`].
    pub fn digest(&self) -> Result<String, DomainError> {
        Ok(sha256_digest(&self.canonical_bytes()?))
    }

    pub fn to_json_pretty(&self) -> Result<String, DomainError> {
        Ok(serde_json::to_string_pretty(&serde_json::to_value(self)?)?)
    }

    /// Reads a document back, refusing other MAJOR schema versions.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DomainError> {
        let artifacts: Self = serde_json::from_slice(bytes)?;
        let major = |v: &str| v.split('.').next().map(str::to_string);
        if major(&artifacts.version) != major(COMPILED_ARTIFACTS_VERSION) {
            return Err(DomainError::UnsupportedArtifactsVersion {
                found: artifacts.version,
                supported: COMPILED_ARTIFACTS_VERSION.to_string(),
            });
        }
        Ok(artifacts)
    }

    pub fn model(&self, name: &str) -> Option<&ResolvedModel> {
        self.transforms.models.iter().find(|m| m.name == name)
    }
}
