// floe-core/src/ports/mod.rs

pub mod artifact_store;
pub mod environment;

pub use artifact_store::{ArtifactDescriptor, ArtifactStore};
pub use environment::EnvSource;
