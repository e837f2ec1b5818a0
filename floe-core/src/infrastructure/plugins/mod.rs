// floe-core/src/infrastructure/plugins/mod.rs

pub mod catalog;
pub mod compute;
pub mod descriptors;
pub mod identity;
pub mod lineage;

pub use catalog::{GlueCatalog, PolarisCatalog};
pub use compute::{DuckDbCompute, SnowflakeCompute, SparkCompute};
pub use descriptors::{DESCRIPTORS, PluginDescriptor};
pub use identity::{ENV_PRINCIPAL, ENV_ROLES, ENV_TOKEN, EnvIdentity, KeycloakIdentity};
pub use lineage::MarquezLineage;

use crate::domain::plugin::{PluginEntry, PluginRegistry, PluginSource};

/// Plugins compiled into the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinPlugins;

impl PluginSource for BuiltinPlugins {
    fn name(&self) -> &str {
        "builtin"
    }

    fn discover(&self) -> Vec<PluginEntry> {
        let mut entries = vec![
            PluginEntry::compute(DuckDbCompute),
            PluginEntry::compute(SnowflakeCompute),
            PluginEntry::compute(SparkCompute),
            PluginEntry::catalog(PolarisCatalog),
            PluginEntry::catalog(GlueCatalog),
            PluginEntry::lineage(MarquezLineage),
            PluginEntry::identity(EnvIdentity),
            PluginEntry::identity(KeycloakIdentity),
        ];
        entries.extend(DESCRIPTORS.iter().copied().map(PluginEntry::generic));
        entries
    }
}

impl PluginRegistry {
    /// Registry backed by the builtin plugins only.
    pub fn with_builtins() -> Self {
        Self::new(vec![Box::new(BuiltinPlugins)])
    }
}
