// floe-core/src/infrastructure/mod.rs

pub mod config;
pub mod environment;
pub mod error;
pub mod exporters;
pub mod fs;
pub mod plugins;
pub mod store;

pub use environment::ProcessEnv;
pub use plugins::BuiltinPlugins;
pub use store::LocalArtifactStore;
