// floe-core/src/domain/spec/manifest.rs

use super::floe_spec::{API_VERSION, PluginSelection};
use super::validation::FieldError;
use crate::domain::governance::GovernanceConfig;
use crate::domain::plugin::CapabilityKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use validator::Validate;

pub const MANIFEST_KIND: &str = "Manifest";

/// Position of a manifest in the inheritance hierarchy. A manifest without
/// scope is a self-contained 2-tier platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestScope {
    Enterprise,
    Domain,
}

/// How the platform is organised, derived from the leaf manifest's scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    Simple,
    Centralized,
    Mesh,
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Simple => "simple",
            Self::Centralized => "centralized",
            Self::Mesh => "mesh",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ManifestMetadata {
    #[validate(length(min = 1, message = "manifest name is required"))]
    #[serde(default)]
    pub name: String,

    #[validate(length(min = 1, message = "manifest version is required"))]
    #[serde(default)]
    pub version: String,

    #[validate(length(min = 1, message = "manifest owner is required"))]
    #[serde(default)]
    pub owner: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct PlatformManifest {
    #[serde(rename = "apiVersion", default)]
    pub api_version: String,

    #[serde(default)]
    pub kind: String,

    #[validate(nested)]
    #[serde(default)]
    pub metadata: ManifestMetadata,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<ManifestScope>,

    /// Path of the enterprise manifest, relative to this file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_manifest: Option<String>,

    #[serde(default)]
    pub plugins: BTreeMap<CapabilityKind, PluginSelection>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub approved_plugins: BTreeMap<CapabilityKind, Vec<String>>,

    #[validate(nested)]
    #[serde(default)]
    pub governance: GovernanceConfig,
}

impl PlatformManifest {
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: MANIFEST_KIND.to_string(),
            metadata: ManifestMetadata {
                name: name.into(),
                version: "1.0.0".to_string(),
                owner: owner.into(),
                description: None,
            },
            ..Default::default()
        }
    }

    pub fn with_plugin(mut self, capability: CapabilityKind, plugin_type: &str) -> Self {
        self.plugins
            .insert(capability, PluginSelection::new(plugin_type));
        self
    }

    pub fn with_approved(mut self, capability: CapabilityKind, names: &[&str]) -> Self {
        self.approved_plugins
            .insert(capability, names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn approved(&self, capability: CapabilityKind) -> Option<&[String]> {
        self.approved_plugins.get(&capability).map(Vec::as_slice)
    }

    pub fn cross_field_errors(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.api_version != API_VERSION {
            errors.push(FieldError::new(
                "apiVersion",
                format!("expected '{}', found '{}'", API_VERSION, self.api_version),
            ));
        }
        if self.kind != MANIFEST_KIND {
            errors.push(FieldError::new(
                "kind",
                format!("expected '{}', found '{}'", MANIFEST_KIND, self.kind),
            ));
        }

        match (self.scope, &self.parent_manifest) {
            (Some(ManifestScope::Domain), None) => errors.push(FieldError::new(
                "parent_manifest",
                "a domain manifest must name its enterprise parent_manifest",
            )),
            (Some(ManifestScope::Enterprise) | None, Some(_)) => errors.push(FieldError::new(
                "parent_manifest",
                "only a manifest with scope 'domain' can declare a parent_manifest",
            )),
            _ => {}
        }

        for (capability, selection) in &self.plugins {
            if selection.plugin_type.trim().is_empty() {
                errors.push(FieldError::new(
                    format!("plugins.{}.type", capability),
                    "plugin type is required",
                ));
            }
        }

        for (capability, names) in &self.approved_plugins {
            if names.is_empty() {
                errors.push(FieldError::new(
                    format!("approved_plugins.{}", capability),
                    "an approved list must name at least one plugin",
                ));
            }
        }

        errors.extend(self.governance.cross_field_errors("governance"));
        errors
    }
}

/// Validated inheritance chain, parent first. At most enterprise -> domain.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestChain {
    manifests: Vec<PlatformManifest>,
}

impl ManifestChain {
    pub fn single(manifest: PlatformManifest) -> Self {
        Self {
            manifests: vec![manifest],
        }
    }

    /// Builds an enterprise -> domain chain, checking the scopes line up.
    pub fn inherited(parent: PlatformManifest, child: PlatformManifest) -> Result<Self, String> {
        if parent.scope != Some(ManifestScope::Enterprise) {
            return Err(format!(
                "parent manifest '{}' must have scope 'enterprise'",
                parent.metadata.name
            ));
        }
        if child.scope != Some(ManifestScope::Domain) {
            return Err(format!(
                "manifest '{}' inherits from a parent but does not have scope 'domain'",
                child.metadata.name
            ));
        }
        Ok(Self {
            manifests: vec![parent, child],
        })
    }

    pub fn leaf(&self) -> &PlatformManifest {
        // Never empty: both constructors push at least one manifest
        &self.manifests[self.manifests.len() - 1]
    }

    pub fn leaf_mut(&mut self) -> &mut PlatformManifest {
        let last = self.manifests.len() - 1;
        &mut self.manifests[last]
    }

    pub fn parent(&self) -> Option<&PlatformManifest> {
        (self.manifests.len() > 1).then(|| &self.manifests[0])
    }

    pub fn manifests(&self) -> &[PlatformManifest] {
        &self.manifests
    }

    pub fn manifests_mut(&mut self) -> &mut [PlatformManifest] {
        &mut self.manifests
    }

    /// `name@version` of each manifest, parent first.
    pub fn names(&self) -> Vec<String> {
        self.manifests
            .iter()
            .map(|m| format!("{}@{}", m.metadata.name, m.metadata.version))
            .collect()
    }

    pub fn mode(&self) -> DeploymentMode {
        match self.leaf().scope {
            None => DeploymentMode::Simple,
            Some(ManifestScope::Enterprise) => DeploymentMode::Centralized,
            Some(ManifestScope::Domain) => DeploymentMode::Mesh,
        }
    }

    /// 2-tier platforms do not accept spec-level plugin overrides at all.
    pub fn is_two_tier(&self) -> bool {
        self.leaf().scope.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest() {
        let yaml = r#"
apiVersion: floe.dev/v1
kind: Manifest
metadata:
  name: acme-platform
  version: 2.0.0
  owner: platform@acme.io
plugins:
  compute:
    type: duckdb
    config:
      path: /tmp/warehouse.duckdb
approved_plugins:
  compute: [duckdb, snowflake]
"#;
        let manifest: PlatformManifest = serde_yaml::from_str(yaml).unwrap();
        assert!(manifest.validate().is_ok());
        assert!(manifest.cross_field_errors().is_empty());
        assert_eq!(
            manifest.plugins[&CapabilityKind::Compute].plugin_type,
            "duckdb"
        );
        assert_eq!(
            manifest.approved(CapabilityKind::Compute).unwrap(),
            ["duckdb", "snowflake"]
        );
        assert_eq!(ManifestChain::single(manifest).mode(), DeploymentMode::Simple);
    }

    #[test]
    fn test_scope_and_parent_must_agree() {
        let mut manifest = PlatformManifest::new("m", "o");
        manifest.scope = Some(ManifestScope::Domain);
        let errors = manifest.cross_field_errors();
        assert_eq!(errors[0].path, "parent_manifest");

        manifest.scope = None;
        manifest.parent_manifest = Some("../enterprise.yaml".into());
        assert_eq!(manifest.cross_field_errors().len(), 1);
    }

    #[test]
    fn test_inherited_chain_requires_scopes() {
        let mut parent = PlatformManifest::new("enterprise", "o");
        let mut child = PlatformManifest::new("sales", "o");
        assert!(ManifestChain::inherited(parent.clone(), child.clone()).is_err());

        parent.scope = Some(ManifestScope::Enterprise);
        child.scope = Some(ManifestScope::Domain);
        let chain = ManifestChain::inherited(parent, child).unwrap();
        assert_eq!(chain.mode(), DeploymentMode::Mesh);
        assert_eq!(chain.names(), vec!["enterprise@1.0.0", "sales@1.0.0"]);
        assert_eq!(chain.leaf().metadata.name, "sales");
        assert!(!chain.is_two_tier());
    }
}
