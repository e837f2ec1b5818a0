// floe-core/src/domain/plugin/traits.rs

// Capability interfaces. The resolver and the registry only ever talk to
// plugins through these traits, never through concrete plugin types.

use super::{CapabilityKind, FLOE_PLUGIN_API_VERSION, PluginError};
use crate::domain::identity::{IdentityError, Principal};
use crate::domain::spec::MaterializationType;
use crate::ports::EnvSource;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Free-form plugin configuration as written in the manifest.
pub type PluginConfig = BTreeMap<String, Value>;

pub trait FloePlugin: Send + Sync {
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    /// Plugin API version the plugin was built against.
    fn api_version(&self) -> &str {
        FLOE_PLUGIN_API_VERSION
    }

    fn capability(&self) -> CapabilityKind;

    fn description(&self) -> &str {
        ""
    }

    /// Returns one human readable issue per problem; empty means valid.
    fn validate_config(&self, _config: &PluginConfig) -> Vec<String> {
        Vec::new()
    }
}

/// Owned snapshot of a plugin's identity, kept next to its handle so that
/// version checks and listings never need the trait object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetadata {
    pub name: String,
    pub version: String,
    pub api_version: String,
    pub capability: CapabilityKind,
    pub description: String,
}

impl PluginMetadata {
    pub fn of<P: FloePlugin + ?Sized>(plugin: &P) -> Self {
        Self {
            name: plugin.name().to_string(),
            version: plugin.version().to_string(),
            api_version: plugin.api_version().to_string(),
            capability: plugin.capability(),
            description: plugin.description().to_string(),
        }
    }
}

// --- COMPUTE ---

pub struct ProfileContext<'a> {
    pub product: &'a str,
    pub target: &'a str,
    pub config: &'a PluginConfig,
}

pub trait ComputePlugin: FloePlugin {
    fn supported_materializations(&self) -> &[MaterializationType];

    /// Translates the compute config into one dbt profile output.
    fn generate_dbt_profile(&self, ctx: &ProfileContext<'_>) -> Result<Value, PluginError>;
}

// --- CATALOG ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConnection {
    pub catalog: String,
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Value>,
}

pub trait CatalogPlugin: FloePlugin {
    fn connection_config(&self, config: &PluginConfig) -> Result<CatalogConnection, PluginError>;
}

// --- LINEAGE ---

pub trait LineageBackendPlugin: FloePlugin {
    fn namespace(&self, product: &str, domain: Option<&str>) -> String;

    fn transport_config(&self, config: &PluginConfig) -> Value;
}

// --- IDENTITY ---

pub trait IdentityPlugin: FloePlugin {
    fn authenticate(
        &self,
        config: &PluginConfig,
        env: &dyn EnvSource,
    ) -> Result<Principal, IdentityError>;
}

// --- CONFIG HELPERS ---

pub fn config_str<'a>(config: &'a PluginConfig, key: &str) -> Option<&'a str> {
    config.get(key).and_then(Value::as_str)
}

/// Keys from `required` that are missing or not a non-empty string.
pub fn missing_string_keys(config: &PluginConfig, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|key| config_str(config, key).is_none_or(|v| v.trim().is_empty()))
        .map(|key| format!("missing required key '{}'", key))
        .collect()
}
