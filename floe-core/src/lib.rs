// floe-core/src/lib.rs

// 1. Documentation is not enforced yet
#![allow(missing_docs)]
// 2. Memory safety
#![deny(unsafe_code)]
// 3. Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// 4. Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (Interfaces / Traits)
// Contracts towards external collaborators (artifact store, environment).
pub mod ports;

// 2. Domain (business core)
// Spec & manifest model, plugin registry, resolver, policy enforcer,
// quality scorer, artifact compiler. Depends on nothing but the ports.
pub mod domain;

// 3. Infrastructure (Adapters)
// YAML loading, builtin plugins, exporters, local artifact store.
pub mod infrastructure;

// 4. Application (Use Cases)
// Compile pipeline orchestration: Load -> Resolve -> Enforce -> Score -> Generate.
pub mod application;

// --- GLOBAL ERROR HANDLING ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
pub use error::FloeError;
