// floe-core/src/application/publish.rs

use crate::domain::compiler::{COMPILED_ARTIFACTS_MEDIA_TYPE, CompiledArtifacts};
use crate::error::FloeError;
use crate::ports::{ArtifactDescriptor, ArtifactStore};
use tracing::{info, instrument};

/// Stores the canonical bytes of `artifacts`; the descriptor digest is the
/// artifacts digest.
#[instrument(skip_all, fields(product = %artifacts.metadata.product_name))]
pub async fn publish(
    store: &dyn ArtifactStore,
    artifacts: &CompiledArtifacts,
) -> Result<ArtifactDescriptor, FloeError> {
    let bytes = artifacts.canonical_bytes()?;
    let descriptor = store.put(COMPILED_ARTIFACTS_MEDIA_TYPE, &bytes).await?;
    info!(digest = %descriptor.digest, size = descriptor.size, "Artifacts published");
    Ok(descriptor)
}

/// Reads artifacts back by digest, refusing an unsupported MAJOR version.
pub async fn fetch(store: &dyn ArtifactStore, digest: &str) -> Result<CompiledArtifacts, FloeError> {
    let bytes = store.get(digest).await?;
    Ok(CompiledArtifacts::from_slice(&bytes)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::pipeline::{CompileContext, CompileOptions, compile};
    use crate::domain::plugin::{CapabilityKind, PluginRegistry};
    use crate::domain::spec::{FloeSpec, ManifestChain, PlatformManifest, TransformSpec};
    use crate::infrastructure::store::LocalArtifactStore;
    use anyhow::Result;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_publish_then_fetch() -> Result<()> {
        let registry = PluginRegistry::with_builtins();
        let env: BTreeMap<String, String> = BTreeMap::new();
        let ctx = CompileContext {
            registry: &registry,
            env: &env,
        };
        let spec = FloeSpec::new("orders", "1.0.0").with_transform(TransformSpec::named("stg_orders"));
        let chain = ManifestChain::single(
            PlatformManifest::new("acme", "platform@acme.io")
                .with_plugin(CapabilityKind::Compute, "duckdb"),
        );
        let options = CompileOptions::new(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
        let outcome = compile(&spec, &chain, &ctx, &options)?;

        let dir = tempdir()?;
        let store = LocalArtifactStore::new(dir.path());
        let descriptor = publish(&store, &outcome.artifacts).await?;
        assert_eq!(descriptor.digest, outcome.digest);
        assert_eq!(descriptor.media_type, COMPILED_ARTIFACTS_MEDIA_TYPE);

        let fetched = fetch(&store, &descriptor.digest).await?;
        assert_eq!(fetched, outcome.artifacts);
        Ok(())
    }
}
