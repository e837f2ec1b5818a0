// floe-core/src/ports/environment.rs

use std::collections::BTreeMap;

/// Read access to environment-provided values (tokens, principals, overrides).
pub trait EnvSource: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

// Handy for tests and for embedding callers that resolve values themselves.
impl EnvSource for BTreeMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}
