// floe-core/src/domain/spec/mod.rs

pub mod floe_spec;
pub mod manifest;
pub mod validation;

pub use floe_spec::{
    API_VERSION, ColumnSpec, ColumnTest, FloeSpec, MaterializationType, PluginSelection,
    ProductMetadata, QualityCheckSpec, QualityTier, SPEC_KIND, SourceDeclaration, TransformSpec,
};
pub use manifest::{
    DeploymentMode, MANIFEST_KIND, ManifestChain, ManifestMetadata, ManifestScope,
    PlatformManifest,
};
pub use validation::{FieldError, flatten_errors};
