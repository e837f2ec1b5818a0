// floe-core/src/domain/plugin/registry.rs

// Catalog of (capability, name) -> plugin. There is no global instance: the
// registry is a context object handed to the pipeline, so every test builds
// its own. Discovery is lazy and cached until `reset()`.

use super::traits::{
    CatalogPlugin, ComputePlugin, FloePlugin, IdentityPlugin, LineageBackendPlugin,
    PluginConfig, PluginMetadata,
};
use super::version::{ApiVersion, FLOE_PLUGIN_API_VERSION};
use super::{CapabilityKind, PluginError};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

#[derive(Clone)]
pub enum PluginHandle {
    Compute(Arc<dyn ComputePlugin>),
    Catalog(Arc<dyn CatalogPlugin>),
    Lineage(Arc<dyn LineageBackendPlugin>),
    Identity(Arc<dyn IdentityPlugin>),
    /// Capabilities the compiler only records (orchestrator, storage...).
    Generic(Arc<dyn FloePlugin>),
}

#[derive(Clone)]
pub struct PluginEntry {
    metadata: PluginMetadata,
    handle: PluginHandle,
}

impl PluginEntry {
    pub fn compute<P: ComputePlugin + 'static>(plugin: P) -> Self {
        Self {
            metadata: PluginMetadata::of(&plugin),
            handle: PluginHandle::Compute(Arc::new(plugin)),
        }
    }

    pub fn catalog<P: CatalogPlugin + 'static>(plugin: P) -> Self {
        Self {
            metadata: PluginMetadata::of(&plugin),
            handle: PluginHandle::Catalog(Arc::new(plugin)),
        }
    }

    pub fn lineage<P: LineageBackendPlugin + 'static>(plugin: P) -> Self {
        Self {
            metadata: PluginMetadata::of(&plugin),
            handle: PluginHandle::Lineage(Arc::new(plugin)),
        }
    }

    pub fn identity<P: IdentityPlugin + 'static>(plugin: P) -> Self {
        Self {
            metadata: PluginMetadata::of(&plugin),
            handle: PluginHandle::Identity(Arc::new(plugin)),
        }
    }

    pub fn generic<P: FloePlugin + 'static>(plugin: P) -> Self {
        Self {
            metadata: PluginMetadata::of(&plugin),
            handle: PluginHandle::Generic(Arc::new(plugin)),
        }
    }

    pub fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    pub fn handle(&self) -> &PluginHandle {
        &self.handle
    }

    pub fn key(&self) -> (CapabilityKind, String) {
        (self.metadata.capability, self.metadata.name.clone())
    }

    pub fn validate_config(&self, config: &PluginConfig) -> Vec<String> {
        match &self.handle {
            PluginHandle::Compute(p) => p.validate_config(config),
            PluginHandle::Catalog(p) => p.validate_config(config),
            PluginHandle::Lineage(p) => p.validate_config(config),
            PluginHandle::Identity(p) => p.validate_config(config),
            PluginHandle::Generic(p) => p.validate_config(config),
        }
    }

    fn check_compatibility(&self, required: &str) -> Result<(), PluginError> {
        let incompatible = || PluginError::Incompatible {
            kind: self.metadata.capability,
            name: self.metadata.name.clone(),
            plugin_version: self.metadata.api_version.clone(),
            required_version: required.to_string(),
        };
        let declared = ApiVersion::parse(&self.metadata.api_version).map_err(|_| incompatible())?;
        let host = ApiVersion::parse(required).map_err(|_| incompatible())?;
        if declared.is_compatible_with(&host) {
            Ok(())
        } else {
            Err(incompatible())
        }
    }
}

impl fmt::Debug for PluginEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginEntry")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Somewhere plugins can be discovered from (builtin table, a test fixture...).
pub trait PluginSource: Send + Sync {
    fn name(&self) -> &str;

    fn discover(&self) -> Vec<PluginEntry>;
}

type PluginKey = (CapabilityKind, String);

#[derive(Default)]
struct RegistryState {
    discovered: bool,
    entries: BTreeMap<PluginKey, PluginEntry>,
    overrides: BTreeMap<PluginKey, PluginEntry>,
}

impl RegistryState {
    fn lookup(&self, kind: CapabilityKind, name: &str) -> Option<&PluginEntry> {
        let key = (kind, name.to_string());
        self.overrides.get(&key).or_else(|| self.entries.get(&key))
    }
}

pub struct PluginRegistry {
    sources: Vec<Box<dyn PluginSource>>,
    required_api_version: String,
    state: RwLock<RegistryState>,
}

impl PluginRegistry {
    pub fn new(sources: Vec<Box<dyn PluginSource>>) -> Self {
        Self {
            sources,
            required_api_version: FLOE_PLUGIN_API_VERSION.to_string(),
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Registry with no sources; plugins only come from `register`.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn with_required_api_version(mut self, version: impl Into<String>) -> Self {
        self.required_api_version = version.into();
        self
    }

    pub fn required_api_version(&self) -> &str {
        &self.required_api_version
    }

    /// Looks a plugin up, discovering sources on first use.
    pub fn get(&self, kind: CapabilityKind, name: &str) -> Result<PluginEntry, PluginError> {
        let entry = self
            .with_discovered(|state| state.lookup(kind, name).cloned())
            .ok_or_else(|| PluginError::NotFound {
                kind,
                name: name.to_string(),
            })?;
        entry.check_compatibility(&self.required_api_version)?;
        Ok(entry)
    }

    pub fn compute(&self, name: &str) -> Result<Arc<dyn ComputePlugin>, PluginError> {
        match self.get(CapabilityKind::Compute, name)?.handle {
            PluginHandle::Compute(p) => Ok(p),
            _ => Err(unsupported(CapabilityKind::Compute, name)),
        }
    }

    pub fn catalog(&self, name: &str) -> Result<Arc<dyn CatalogPlugin>, PluginError> {
        match self.get(CapabilityKind::Catalog, name)?.handle {
            PluginHandle::Catalog(p) => Ok(p),
            _ => Err(unsupported(CapabilityKind::Catalog, name)),
        }
    }

    pub fn lineage(&self, name: &str) -> Result<Arc<dyn LineageBackendPlugin>, PluginError> {
        match self.get(CapabilityKind::LineageBackend, name)?.handle {
            PluginHandle::Lineage(p) => Ok(p),
            _ => Err(unsupported(CapabilityKind::LineageBackend, name)),
        }
    }

    pub fn identity(&self, name: &str) -> Result<Arc<dyn IdentityPlugin>, PluginError> {
        match self.get(CapabilityKind::Identity, name)?.handle {
            PluginHandle::Identity(p) => Ok(p),
            _ => Err(unsupported(CapabilityKind::Identity, name)),
        }
    }

    /// Registers `entry`, shadowing any discovered plugin with the same key.
    pub fn register(&self, entry: PluginEntry) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        debug!(
            capability = %entry.metadata.capability,
            plugin = %entry.metadata.name,
            "Registering plugin override"
        );
        state.overrides.insert(entry.key(), entry);
    }

    /// Drops every discovered and registered plugin. Safe before first use;
    /// the next `get` rediscovers from the sources.
    pub fn reset(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = RegistryState::default();
        debug!("Plugin registry reset");
    }

    /// Sorted snapshot of every visible plugin.
    pub fn list(&self) -> Vec<PluginMetadata> {
        self.with_discovered(|state| {
            let mut merged: BTreeMap<&PluginKey, &PluginEntry> = state.entries.iter().collect();
            merged.extend(state.overrides.iter());
            merged.values().map(|e| e.metadata.clone()).collect()
        })
    }

    // Runs `f` against a discovered state. The lookup happens under the same
    // lock that observed (or performed) discovery, so a concurrent `reset`
    // can never be seen half-way.
    fn with_discovered<T>(&self, f: impl Fn(&RegistryState) -> T) -> T {
        {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            if state.discovered {
                return f(&state);
            }
        }

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state.discovered {
            self.discover_into(&mut state);
        }
        f(&state)
    }

    fn discover_into(&self, state: &mut RegistryState) {
        for source in &self.sources {
            let found = source.discover();
            debug!(source = source.name(), count = found.len(), "Discovered plugins");
            for entry in found {
                let key = entry.key();
                if state.entries.contains_key(&key) {
                    warn!(
                        source = source.name(),
                        capability = %key.0,
                        plugin = %key.1,
                        "Duplicate plugin ignored (first source wins)"
                    );
                    continue;
                }
                state.entries.insert(key, entry);
            }
        }
        state.discovered = true;
        info!(plugins = state.entries.len(), "Plugin discovery complete");
    }
}

fn unsupported(kind: CapabilityKind, name: &str) -> PluginError {
    PluginError::CapabilityUnsupported {
        kind,
        name: name.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubPlugin {
        name: &'static str,
        api: &'static str,
        kind: CapabilityKind,
    }

    impl FloePlugin for StubPlugin {
        fn name(&self) -> &str {
            self.name
        }
        fn version(&self) -> &str {
            "0.1.0"
        }
        fn api_version(&self) -> &str {
            self.api
        }
        fn capability(&self) -> CapabilityKind {
            self.kind
        }
    }

    struct CountingSource {
        scans: Arc<AtomicUsize>,
    }

    impl PluginSource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        fn discover(&self) -> Vec<PluginEntry> {
            self.scans.fetch_add(1, Ordering::SeqCst);
            vec![
                PluginEntry::generic(StubPlugin {
                    name: "dagster",
                    api: "1.0",
                    kind: CapabilityKind::Orchestrator,
                }),
                PluginEntry::generic(StubPlugin {
                    name: "legacy",
                    api: "0.9",
                    kind: CapabilityKind::Orchestrator,
                }),
                PluginEntry::generic(StubPlugin {
                    name: "future",
                    api: "2.0",
                    kind: CapabilityKind::Orchestrator,
                }),
            ]
        }
    }

    fn counting_registry() -> (PluginRegistry, Arc<AtomicUsize>) {
        let scans = Arc::new(AtomicUsize::new(0));
        let registry = PluginRegistry::new(vec![Box::new(CountingSource {
            scans: scans.clone(),
        })]);
        (registry, scans)
    }

    #[test]
    fn test_discovery_is_lazy_and_cached() {
        let (registry, scans) = counting_registry();
        assert_eq!(scans.load(Ordering::SeqCst), 0);

        registry.get(CapabilityKind::Orchestrator, "dagster").unwrap();
        registry.get(CapabilityKind::Orchestrator, "dagster").unwrap();
        assert_eq!(scans.load(Ordering::SeqCst), 1);

        registry.reset();
        registry.get(CapabilityKind::Orchestrator, "dagster").unwrap();
        assert_eq!(scans.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_not_found() {
        let (registry, _) = counting_registry();
        let err = registry
            .get(CapabilityKind::Orchestrator, "airflow")
            .unwrap_err();
        assert_eq!(
            err,
            PluginError::NotFound {
                kind: CapabilityKind::Orchestrator,
                name: "airflow".into()
            }
        );
        // Same name under another capability is a different key
        assert!(registry.get(CapabilityKind::Compute, "dagster").is_err());
    }

    #[test]
    fn test_incompatible_versions_are_rejected() {
        let (registry, _) = counting_registry();
        let err = registry
            .get(CapabilityKind::Orchestrator, "legacy")
            .unwrap_err();
        match err {
            PluginError::Incompatible {
                plugin_version,
                required_version,
                ..
            } => {
                assert_eq!(plugin_version, "0.9");
                assert_eq!(required_version, FLOE_PLUGIN_API_VERSION);
            }
            other => panic!("Expected Incompatible, got {other:?}"),
        }
        assert!(matches!(
            registry.get(CapabilityKind::Orchestrator, "future"),
            Err(PluginError::Incompatible { .. })
        ));
    }

    #[test]
    fn test_register_overrides_discovered_plugin() {
        let (registry, _) = counting_registry();
        registry.register(PluginEntry::generic(StubPlugin {
            name: "legacy",
            api: "1.3",
            kind: CapabilityKind::Orchestrator,
        }));
        let entry = registry
            .get(CapabilityKind::Orchestrator, "legacy")
            .unwrap();
        assert_eq!(entry.metadata().api_version, "1.3");

        registry.reset();
        // Override is gone, the discovered incompatible one is back
        assert!(registry.get(CapabilityKind::Orchestrator, "legacy").is_err());
    }

    #[test]
    fn test_reset_before_first_use_is_safe() {
        let registry = PluginRegistry::empty();
        registry.reset();
        assert!(registry.list().is_empty());
    }

    #[test]
    fn test_typed_accessor_rejects_wrong_handle() {
        let registry = PluginRegistry::empty();
        registry.register(PluginEntry::generic(StubPlugin {
            name: "fake",
            api: "1.0",
            kind: CapabilityKind::Compute,
        }));
        assert!(matches!(
            registry.compute("fake"),
            Err(PluginError::CapabilityUnsupported { .. })
        ));
    }

    #[test]
    fn test_list_is_sorted_and_concurrent_reads_are_safe() {
        let (registry, scans) = counting_registry();
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    registry.get(CapabilityKind::Orchestrator, "dagster").unwrap();
                });
            }
        });
        assert_eq!(scans.load(Ordering::SeqCst), 1);

        let names: Vec<String> = registry.list().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["dagster", "future", "legacy"]);
    }
}
