// floe-core/src/infrastructure/store/mod.rs

pub mod local;

pub use local::LocalArtifactStore;
