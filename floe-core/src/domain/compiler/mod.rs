// floe-core/src/domain/compiler/mod.rs

pub mod artifacts;
pub mod digest;
pub mod generator;

pub use artifacts::{
    ArtifactMetadata, COMPILED_ARTIFACTS_MEDIA_TYPE, COMPILED_ARTIFACTS_VERSION,
    CompiledArtifacts, CompiledTransforms, FLOE_VERSION, IngestionConfig, LineageConfig,
    ProductIdentity, QualityConfig,
};
pub use digest::{canonical_bytes, digest_hex, sha256_digest};
pub use generator::{ArtifactGenerator, GenerationInput, source_hash};
