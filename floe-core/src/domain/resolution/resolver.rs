// floe-core/src/domain/resolution/resolver.rs

use super::checks::checks_for_transform;
use super::error::ResolutionError;
use super::inheritance::effective_manifest;
use super::model::{ResolvedColumn, ResolvedModel};
use super::secrets::scan_config;
use crate::domain::governance::GovernanceConfig;
use crate::domain::graph::ModelGraph;
use crate::domain::plugin::{
    CapabilityKind, ComputePlugin, PluginConfig, PluginError, PluginRegistry,
};
use crate::domain::spec::{
    DeploymentMode, FloeSpec, ManifestChain, PlatformManifest, PluginSelection, ProductMetadata,
    TransformSpec,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, instrument};

fn re_ref() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\bref\s*\(\s*['"]([^'"]+)['"]\s*\)"#)
            .unwrap_or_else(|_| Regex::new("$^").unwrap_or_else(|_| unreachable!()))
    })
}

fn re_source() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\bsource\s*\(\s*['"]([^'"]+)['"]\s*,\s*['"]([^'"]+)['"]\s*\)"#)
            .unwrap_or_else(|_| Regex::new("$^").unwrap_or_else(|_| unreachable!()))
    })
}

/// `ref('x')` targets found in a SQL body.
pub fn extract_refs(sql: &str) -> BTreeSet<String> {
    re_ref()
        .captures_iter(sql)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// `source('s', 't')` targets, as `s.t`.
pub fn extract_sources(sql: &str) -> BTreeSet<String> {
    re_source()
        .captures_iter(sql)
        .filter_map(|c| match (c.get(1), c.get(2)) {
            (Some(s), Some(t)) => Some(format!("{}.{}", s.as_str(), t.as_str())),
            _ => None,
        })
        .collect()
}

/// A plugin binding actually in effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPlugin {
    #[serde(rename = "type")]
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: PluginConfig,
    /// Set when floe.yaml, not the manifest, picked this plugin.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub spec_override: bool,
}

/// Output of the resolver: everything later stages need, nothing mutable.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub product: ProductMetadata,
    /// Effective manifest after inheritance.
    pub manifest: PlatformManifest,
    pub inheritance_chain: Vec<String>,
    pub mode: DeploymentMode,
    pub plugins: BTreeMap<CapabilityKind, ResolvedPlugin>,
    pub models: Vec<ResolvedModel>,
    pub declared_sources: BTreeSet<String>,
}

impl Resolution {
    pub fn governance(&self) -> &GovernanceConfig {
        &self.manifest.governance
    }

    pub fn model(&self, name: &str) -> Option<&ResolvedModel> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn plugin(&self, capability: CapabilityKind) -> Option<&ResolvedPlugin> {
        self.plugins.get(&capability)
    }

    /// Platform compute, always present after a successful resolution.
    pub fn compute_name(&self) -> &str {
        self.plugin(CapabilityKind::Compute)
            .map(|p| p.name.as_str())
            .unwrap_or_default()
    }

    /// Computes bound by individual transforms that differ from the platform one.
    pub fn alternate_computes(&self) -> BTreeSet<&str> {
        let platform = self.compute_name();
        self.models
            .iter()
            .map(|m| m.compute.as_str())
            .filter(|c| *c != platform)
            .collect()
    }

    pub fn graph(&self) -> ModelGraph {
        ModelGraph::new(self.models.clone(), self.declared_sources.clone())
    }
}

pub struct Resolver<'r> {
    registry: &'r PluginRegistry,
}

impl<'r> Resolver<'r> {
    pub fn new(registry: &'r PluginRegistry) -> Self {
        Self { registry }
    }

    #[instrument(skip_all, fields(product = %spec.metadata.name))]
    pub fn resolve(
        &self,
        spec: &FloeSpec,
        chain: &ManifestChain,
    ) -> Result<Resolution, ResolutionError> {
        // 1. Inheritance
        let manifest = effective_manifest(chain)?;

        // 2. Manifest selections, checked against approved_plugins
        let mut selections: BTreeMap<CapabilityKind, (PluginSelection, bool)> = BTreeMap::new();
        for (capability, selection) in &manifest.plugins {
            check_approved(&manifest, *capability, &selection.plugin_type)?;
            selections.insert(*capability, (selection.clone(), false));
        }

        // 3. Spec-level overrides
        for (capability, selection) in &spec.plugins {
            if chain.is_two_tier() {
                return Err(ResolutionError::ScopeViolation {
                    capability: *capability,
                    reason: "2-tier platforms do not accept spec-level plugin overrides".into(),
                });
            }
            if manifest.approved(*capability).is_some() {
                return Err(ResolutionError::ScopeViolation {
                    capability: *capability,
                    reason: "the capability is locked by approved_plugins".into(),
                });
            }
            info!(capability = %capability, plugin = %selection.plugin_type, "Spec-level plugin override");
            selections.insert(*capability, (selection.clone(), true));
        }

        if !selections.contains_key(&CapabilityKind::Compute) {
            return Err(ResolutionError::MissingCapability(CapabilityKind::Compute));
        }

        // 4. Secret scanning, before anything else reads the configs
        let scanning = manifest.governance.secret_scanning();
        if scanning.is_enabled() {
            for (capability, (selection, _)) in &selections {
                scan_config(*capability, &selection.config, &scanning.sensitive_keys)?;
            }
        }

        // 5. Registry lookups and plugin-level config validation
        let mut plugins = BTreeMap::new();
        for (capability, (selection, spec_override)) in selections {
            let entry = self.registry.get(capability, &selection.plugin_type)?;
            let issues = entry.validate_config(&selection.config);
            if !issues.is_empty() {
                return Err(PluginError::InvalidConfig {
                    kind: capability,
                    name: selection.plugin_type,
                    issues,
                }
                .into());
            }
            debug!(capability = %capability, plugin = %selection.plugin_type, "Plugin bound");
            plugins.insert(
                capability,
                ResolvedPlugin {
                    name: selection.plugin_type,
                    version: entry.metadata().version.clone(),
                    config: selection.config,
                    spec_override,
                },
            );
        }

        // 6. Transforms
        let platform_compute = plugins
            .get(&CapabilityKind::Compute)
            .map(|p| p.name.clone())
            .ok_or(ResolutionError::MissingCapability(CapabilityKind::Compute))?;
        let defined: BTreeSet<&str> = spec.transforms.iter().map(|t| t.name.as_str()).collect();
        let mut computes: BTreeMap<String, Arc<dyn ComputePlugin>> = BTreeMap::new();

        let mut models = Vec::with_capacity(spec.transforms.len());
        for transform in &spec.transforms {
            let compute_name =
                self.bind_compute(&manifest, &platform_compute, transform)?;
            if !computes.contains_key(&compute_name) {
                let plugin = self.registry.compute(&compute_name)?;
                computes.insert(compute_name.clone(), plugin);
            }
            let compute = computes
                .get(&compute_name)
                .ok_or_else(|| PluginError::NotFound {
                    kind: CapabilityKind::Compute,
                    name: compute_name.clone(),
                })?;
            models.push(resolve_transform(transform, compute_name.clone(), compute.as_ref(), &defined)?);
        }

        info!(
            models = models.len(),
            plugins = plugins.len(),
            mode = %chain.mode(),
            "Resolution complete"
        );

        Ok(Resolution {
            product: spec.metadata.clone(),
            manifest,
            inheritance_chain: chain.names(),
            mode: chain.mode(),
            plugins,
            models,
            declared_sources: spec.declared_sources(),
        })
    }

    /// A transform may pick another compute only among the approved ones.
    fn bind_compute(
        &self,
        manifest: &PlatformManifest,
        platform: &str,
        transform: &TransformSpec,
    ) -> Result<String, ResolutionError> {
        let Some(requested) = transform.compute.as_deref() else {
            return Ok(platform.to_string());
        };
        if requested == platform {
            return Ok(platform.to_string());
        }
        let approved = manifest
            .approved(CapabilityKind::Compute)
            .map(<[String]>::to_vec)
            .unwrap_or_else(|| vec![platform.to_string()]);
        if !approved.iter().any(|a| a == requested) {
            return Err(ResolutionError::PlanNotApproved {
                capability: CapabilityKind::Compute,
                plugin: requested.to_string(),
                approved,
            });
        }
        debug!(model = %transform.name, compute = requested, "Transform-level compute");
        Ok(requested.to_string())
    }
}

fn check_approved(
    manifest: &PlatformManifest,
    capability: CapabilityKind,
    plugin: &str,
) -> Result<(), ResolutionError> {
    match manifest.approved(capability) {
        Some(approved) if !approved.iter().any(|a| a == plugin) => {
            Err(ResolutionError::PlanNotApproved {
                capability,
                plugin: plugin.to_string(),
                approved: approved.to_vec(),
            })
        }
        _ => Ok(()),
    }
}

fn resolve_transform(
    transform: &TransformSpec,
    compute_name: String,
    compute: &dyn ComputePlugin,
    defined: &BTreeSet<&str>,
) -> Result<ResolvedModel, ResolutionError> {
    let materialization = transform.materialization.unwrap_or_default();
    if !compute.supported_materializations().contains(&materialization) {
        return Err(ResolutionError::UnsupportedMaterialization {
            model: transform.name.clone(),
            compute: compute_name,
            materialization,
        });
    }

    let sql = transform.sql.as_deref().unwrap_or_default();
    let mut depends_on: BTreeSet<String> = transform.depends_on.iter().cloned().collect();
    depends_on.extend(extract_refs(sql));
    if let Some(missing) = depends_on.iter().find(|d| !defined.contains(d.as_str())) {
        return Err(ResolutionError::UnresolvedReference {
            model: transform.name.clone(),
            reference: missing.clone(),
        });
    }

    Ok(ResolvedModel {
        name: transform.name.clone(),
        tier: transform.tier,
        schema: transform.schema.clone(),
        materialization,
        compute: compute_name,
        description: transform.description.clone(),
        tags: transform.tags.clone(),
        meta: transform.meta.clone(),
        columns: transform
            .columns
            .iter()
            .map(|c| ResolvedColumn {
                name: c.name.clone(),
                description: c.description.clone(),
                meta: c.meta.clone(),
            })
            .collect(),
        depends_on: depends_on.into_iter().collect(),
        sources: extract_sources(sql).into_iter().collect(),
        quality_checks: checks_for_transform(transform),
        path: transform.path.clone(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::governance::SecretScanningConfig;
    use crate::domain::plugin::{FloePlugin, PluginEntry, PluginSource, ProfileContext};
    use crate::domain::spec::{ManifestScope, MaterializationType};
    use anyhow::Result;
    use serde_json::{Value, json};

    struct StubCompute {
        name: &'static str,
        materializations: Vec<MaterializationType>,
    }

    impl FloePlugin for StubCompute {
        fn name(&self) -> &str {
            self.name
        }
        fn version(&self) -> &str {
            "1.0.0"
        }
        fn capability(&self) -> CapabilityKind {
            CapabilityKind::Compute
        }
        fn validate_config(&self, config: &PluginConfig) -> Vec<String> {
            match config.get("threads") {
                Some(v) if !v.is_u64() => vec!["threads must be a positive integer".into()],
                _ => Vec::new(),
            }
        }
    }

    impl ComputePlugin for StubCompute {
        fn supported_materializations(&self) -> &[MaterializationType] {
            &self.materializations
        }
        fn generate_dbt_profile(&self, ctx: &ProfileContext<'_>) -> Result<Value, PluginError> {
            Ok(json!({ "type": self.name, "target": ctx.target }))
        }
    }

    struct Stubs;

    impl PluginSource for Stubs {
        fn name(&self) -> &str {
            "stubs"
        }
        fn discover(&self) -> Vec<PluginEntry> {
            vec![
                PluginEntry::compute(StubCompute {
                    name: "duckdb",
                    materializations: vec![MaterializationType::View, MaterializationType::Table],
                }),
                PluginEntry::compute(StubCompute {
                    name: "snowflake",
                    materializations: vec![
                        MaterializationType::View,
                        MaterializationType::Table,
                        MaterializationType::Incremental,
                    ],
                }),
            ]
        }
    }

    fn registry() -> PluginRegistry {
        PluginRegistry::new(vec![Box::new(Stubs)])
    }

    fn customers_spec() -> FloeSpec {
        FloeSpec::new("customer-360", "1.0.0").with_transform(TransformSpec::named("stg_customers"))
    }

    fn manifest(approved: &[&str]) -> ManifestChain {
        ManifestChain::single(
            PlatformManifest::new("acme", "platform@acme.io")
                .with_plugin(CapabilityKind::Compute, "duckdb")
                .with_approved(CapabilityKind::Compute, approved),
        )
    }

    #[test]
    fn test_stg_customers_binds_to_duckdb() -> Result<()> {
        let registry = registry();
        let resolution =
            Resolver::new(&registry).resolve(&customers_spec(), &manifest(&["duckdb", "snowflake"]))?;
        let model = resolution.model("stg_customers").unwrap();
        assert_eq!(model.compute, "duckdb");
        assert_eq!(model.materialization, MaterializationType::View);
        assert_eq!(resolution.compute_name(), "duckdb");
        assert_eq!(resolution.mode, DeploymentMode::Simple);
        Ok(())
    }

    #[test]
    fn test_unapproved_platform_compute_names_plugin_and_capability() {
        let registry = registry();
        let err = Resolver::new(&registry)
            .resolve(&customers_spec(), &manifest(&["snowflake"]))
            .unwrap_err();
        assert!(matches!(
            &err,
            ResolutionError::PlanNotApproved { capability: CapabilityKind::Compute, plugin, .. } if plugin == "duckdb"
        ));
        let message = err.to_string();
        assert!(message.contains("duckdb") && message.contains("compute"));
    }

    #[test]
    fn test_refs_and_sources_become_edges() -> Result<()> {
        let mut orders = TransformSpec::named("stg_orders");
        orders.sql = Some("select * from {{ source('raw', 'orders') }}".into());
        let mut mart = TransformSpec::named("fct_orders");
        mart.sql = Some("select * from {{ ref('stg_orders') }} join {{ ref( \"dim_date\" ) }}".into());
        mart.depends_on = vec!["stg_orders".into()];
        let spec = FloeSpec::new("sales", "1.0.0")
            .with_transform(orders)
            .with_transform(TransformSpec::named("dim_date"))
            .with_transform(mart);

        let registry = registry();
        let resolution = Resolver::new(&registry).resolve(&spec, &manifest(&["duckdb"]))?;
        assert_eq!(
            resolution.model("fct_orders").unwrap().depends_on,
            vec!["dim_date", "stg_orders"]
        );
        assert_eq!(resolution.model("stg_orders").unwrap().sources, vec!["raw.orders"]);
        Ok(())
    }

    #[test]
    fn test_dangling_reference_is_fatal() {
        let mut t = TransformSpec::named("fct_orders");
        t.sql = Some("select * from {{ ref('stg_missing') }}".into());
        let spec = FloeSpec::new("sales", "1.0.0").with_transform(t);
        let registry = registry();
        let err = Resolver::new(&registry)
            .resolve(&spec, &manifest(&["duckdb"]))
            .unwrap_err();
        assert_eq!(
            err,
            ResolutionError::UnresolvedReference {
                model: "fct_orders".into(),
                reference: "stg_missing".into()
            }
        );
    }

    #[test]
    fn test_spec_override_rejected_in_two_tier() {
        let mut spec = customers_spec();
        spec.plugins
            .insert(CapabilityKind::Catalog, PluginSelection::new("polaris"));
        let registry = registry();
        let err = Resolver::new(&registry)
            .resolve(&spec, &manifest(&["duckdb"]))
            .unwrap_err();
        assert!(matches!(err, ResolutionError::ScopeViolation { capability: CapabilityKind::Catalog, .. }));
    }

    #[test]
    fn test_spec_override_in_enterprise_scope() -> Result<()> {
        let mut platform = PlatformManifest::new("acme", "platform@acme.io")
            .with_plugin(CapabilityKind::Compute, "duckdb")
            .with_approved(CapabilityKind::Compute, &["duckdb", "snowflake"]);
        platform.scope = Some(ManifestScope::Enterprise);
        let chain = ManifestChain::single(platform);
        let registry = registry();

        // Compute is locked by approved_plugins
        let mut locked = customers_spec();
        locked
            .plugins
            .insert(CapabilityKind::Compute, PluginSelection::new("snowflake"));
        assert!(matches!(
            Resolver::new(&registry).resolve(&locked, &chain).unwrap_err(),
            ResolutionError::ScopeViolation { .. }
        ));

        // An unlocked capability goes through the registry
        let mut open = customers_spec();
        open.plugins
            .insert(CapabilityKind::Catalog, PluginSelection::new("polaris"));
        assert!(matches!(
            Resolver::new(&registry).resolve(&open, &chain).unwrap_err(),
            ResolutionError::Plugin(PluginError::NotFound { kind: CapabilityKind::Catalog, .. })
        ));
        Ok(())
    }

    #[test]
    fn test_transform_compute_binding() -> Result<()> {
        let mut heavy = TransformSpec::named("fct_events");
        heavy.compute = Some("snowflake".into());
        heavy.materialization = Some(MaterializationType::Incremental);
        let spec = customers_spec().with_transform(heavy);
        let registry = registry();

        let resolution =
            Resolver::new(&registry).resolve(&spec, &manifest(&["duckdb", "snowflake"]))?;
        assert_eq!(resolution.model("fct_events").unwrap().compute, "snowflake");
        assert_eq!(
            resolution.alternate_computes().into_iter().collect::<Vec<_>>(),
            vec!["snowflake"]
        );

        let err = Resolver::new(&registry)
            .resolve(&spec, &manifest(&["duckdb"]))
            .unwrap_err();
        assert!(matches!(err, ResolutionError::PlanNotApproved { .. }));
        Ok(())
    }

    #[test]
    fn test_unsupported_materialization() {
        let mut t = TransformSpec::named("fct_events");
        t.materialization = Some(MaterializationType::Incremental);
        let spec = FloeSpec::new("p", "1").with_transform(t);
        let registry = registry();
        let err = Resolver::new(&registry)
            .resolve(&spec, &manifest(&["duckdb"]))
            .unwrap_err();
        assert!(matches!(err, ResolutionError::UnsupportedMaterialization { .. }));
    }

    #[test]
    fn test_invalid_plugin_config_and_plaintext_secret() {
        let registry = registry();
        let mut chain = manifest(&["duckdb"]);
        chain
            .leaf_mut()
            .plugins
            .get_mut(&CapabilityKind::Compute)
            .unwrap()
            .config
            .insert("threads".into(), json!("four"));
        let err = Resolver::new(&registry)
            .resolve(&customers_spec(), &chain)
            .unwrap_err();
        assert!(matches!(err, ResolutionError::Plugin(PluginError::InvalidConfig { .. })));

        let mut chain = manifest(&["duckdb"]);
        let leaf = chain.leaf_mut();
        leaf.governance.secret_scanning = Some(SecretScanningConfig {
            enabled: Some(true),
            sensitive_keys: vec![],
        });
        leaf.plugins
            .get_mut(&CapabilityKind::Compute)
            .unwrap()
            .config
            .insert("motherduck_token".into(), json!("md-abc"));
        let err = Resolver::new(&registry)
            .resolve(&customers_spec(), &chain)
            .unwrap_err();
        assert!(matches!(err, ResolutionError::PlaintextSecret { .. }));
    }

    #[test]
    fn test_missing_compute() {
        let registry = registry();
        let chain = ManifestChain::single(PlatformManifest::new("acme", "me"));
        assert_eq!(
            Resolver::new(&registry)
                .resolve(&customers_spec(), &chain)
                .unwrap_err(),
            ResolutionError::MissingCapability(CapabilityKind::Compute)
        );
    }
}
