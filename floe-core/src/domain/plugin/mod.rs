// floe-core/src/domain/plugin/mod.rs

pub mod capability;
pub mod error;
pub mod registry;
pub mod traits;
pub mod version;

pub use capability::CapabilityKind;
pub use error::PluginError;
pub use registry::{PluginEntry, PluginHandle, PluginRegistry, PluginSource};
pub use traits::{
    CatalogConnection, CatalogPlugin, ComputePlugin, FloePlugin, IdentityPlugin,
    LineageBackendPlugin, PluginConfig, PluginMetadata, ProfileContext, config_str,
    missing_string_keys,
};
pub use version::{ApiVersion, FLOE_PLUGIN_API_VERSION};
