// floe-core/src/application/mod.rs

pub mod pipeline;
pub mod publish;

// --- RE-EXPORTS (FACADE PATTERN) ---
// The CLI only needs `use floe_core::application::{compile_files, publish, ...}`.

pub use pipeline::{
    CompileContext, CompileOptions, CompileOutcome, DEFAULT_IDENTITY_PROVIDER,
    EnforcementOutcome, compile, compile_files, enforce, enforce_files, load_inputs,
};
pub use publish::{fetch, publish};
