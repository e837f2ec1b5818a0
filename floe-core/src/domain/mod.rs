// floe-core/src/domain/mod.rs

pub mod compiler;
pub mod error;
pub mod governance;
pub mod graph;
pub mod identity;
pub mod plugin;
pub mod quality;
pub mod resolution;
pub mod spec;

// Handy re-exports to keep imports short elsewhere
pub use error::DomainError;
