// floe-core/src/domain/compiler/generator.rs

use super::artifacts::{
    ArtifactMetadata, COMPILED_ARTIFACTS_VERSION, CompiledArtifacts, CompiledTransforms,
    FLOE_VERSION, IngestionConfig, LineageConfig, ProductIdentity, QualityConfig,
};
use super::digest::{canonical_bytes, sha256_digest};
use crate::domain::error::DomainError;
use crate::domain::governance::EnforcementSummary;
use crate::domain::plugin::{
    CapabilityKind, CatalogConnection, PluginConfig, PluginRegistry, ProfileContext,
};
use crate::domain::quality::QualityReport;
use crate::domain::resolution::Resolution;
use crate::domain::spec::{FloeSpec, ManifestChain};
use serde_json::{Map, Value, json};
use tracing::{debug, info, instrument};

/// Digest of everything the artifacts are derived from.
pub fn source_hash(spec: &FloeSpec, chain: &ManifestChain) -> Result<String, DomainError> {
    Ok(sha256_digest(&canonical_bytes(&(spec, chain.manifests()))?))
}

pub struct GenerationInput<'a> {
    pub resolution: &'a Resolution,
    pub enforcement: &'a EnforcementSummary,
    pub quality: &'a QualityReport,
    pub source_hash: String,
    /// dbt target name of the platform compute.
    pub target: &'a str,
    pub compiled_at: Option<String>,
    pub compiled_by: Option<String>,
}

pub struct ArtifactGenerator<'r> {
    registry: &'r PluginRegistry,
}

impl<'r> ArtifactGenerator<'r> {
    pub fn new(registry: &'r PluginRegistry) -> Self {
        Self { registry }
    }

    #[instrument(skip_all, fields(product = %input.resolution.product.name))]
    pub fn generate(&self, input: &GenerationInput<'_>) -> Result<CompiledArtifacts, DomainError> {
        let resolution = input.resolution;
        let product = &resolution.product;

        let execution_plan = resolution.graph().plan_execution()?;
        debug!(layers = execution_plan.len(), "Execution plan ready");

        let governance = resolution.governance();
        let quality_config = QualityConfig {
            provider: resolution
                .plugin(CapabilityKind::Quality)
                .map(|p| p.name.clone()),
            scoring: governance.scoring(),
            gates: governance.quality_gates.clone(),
            checks: resolution
                .models
                .iter()
                .filter(|m| !m.quality_checks.is_empty())
                .map(|m| (m.name.clone(), m.quality_checks.clone()))
                .collect(),
        };

        let artifacts = CompiledArtifacts {
            version: COMPILED_ARTIFACTS_VERSION.to_string(),
            metadata: ArtifactMetadata {
                product_name: product.name.clone(),
                product_version: product.version.clone(),
                floe_version: FLOE_VERSION.to_string(),
                source_hash: input.source_hash.clone(),
                compiled_at: input.compiled_at.clone(),
            },
            identity: ProductIdentity {
                product_id: match &product.domain {
                    Some(domain) => format!("{}.{}", domain, product.name),
                    None => product.name.clone(),
                },
                domain: product.domain.clone(),
                owner: product
                    .owner
                    .clone()
                    .or_else(|| Some(resolution.manifest.metadata.owner.clone()))
                    .filter(|o| !o.is_empty()),
                compiled_by: input.compiled_by.clone(),
            },
            mode: resolution.mode,
            inheritance_chain: resolution.inheritance_chain.clone(),
            plugins: resolution.plugins.clone(),
            transforms: CompiledTransforms {
                models: resolution.models.clone(),
                execution_plan,
            },
            dbt_profiles: self.dbt_profiles(resolution, input.target)?,
            quality_config,
            quality_scores: input.quality.models.clone(),
            aggregate_quality_score: Some(input.quality.aggregate_score),
            enforcement_result: input.enforcement.clone(),
            catalog: self.catalog(resolution)?,
            lineage_backend: self.lineage(resolution),
            ingestion: resolution
                .plugin(CapabilityKind::Ingestion)
                .map(|p| IngestionConfig {
                    plugin: p.name.clone(),
                    config: p.config.clone(),
                }),
        };

        info!(
            models = artifacts.transforms.models.len(),
            version = COMPILED_ARTIFACTS_VERSION,
            "Compiled artifacts generated"
        );
        Ok(artifacts)
    }

    /// One dbt profile named after the product. The platform compute is the
    /// `target` output; every other compute used by a transform gets a
    /// `<target>-<compute>` output built from its defaults.
    fn dbt_profiles(&self, resolution: &Resolution, target: &str) -> Result<Value, DomainError> {
        let product = resolution.product.name.as_str();
        let mut outputs = Map::new();

        if let Some(platform) = resolution.plugin(CapabilityKind::Compute) {
            let compute = self.registry.compute(&platform.name)?;
            outputs.insert(
                target.to_string(),
                compute.generate_dbt_profile(&ProfileContext {
                    product,
                    target,
                    config: &platform.config,
                })?,
            );
        }

        let defaults = PluginConfig::new();
        for name in resolution.alternate_computes() {
            let compute = self.registry.compute(name)?;
            let output = format!("{}-{}", target, name);
            let profile = compute.generate_dbt_profile(&ProfileContext {
                product,
                target: &output,
                config: &defaults,
            })?;
            outputs.insert(output, profile);
        }

        let mut profiles = Map::new();
        profiles.insert(
            product.to_string(),
            json!({ "target": target, "outputs": outputs }),
        );
        Ok(Value::Object(profiles))
    }

    fn catalog(&self, resolution: &Resolution) -> Result<Option<CatalogConnection>, DomainError> {
        let Some(selected) = resolution.plugin(CapabilityKind::Catalog) else {
            return Ok(None);
        };
        let catalog = self.registry.catalog(&selected.name)?;
        Ok(Some(catalog.connection_config(&selected.config)?))
    }

    // Lineage plugins that are not registered with the lineage interface are
    // only recorded in `plugins`.
    fn lineage(&self, resolution: &Resolution) -> Option<LineageConfig> {
        let selected = resolution.plugin(CapabilityKind::LineageBackend)?;
        let lineage = self.registry.lineage(&selected.name).ok()?;
        Some(LineageConfig {
            backend: selected.name.clone(),
            namespace: lineage.namespace(
                &resolution.product.name,
                resolution.product.domain.as_deref(),
            ),
            transport: lineage.transport_config(&selected.config),
        })
    }
}
