// floe-core/src/infrastructure/config/loader.rs

use crate::domain::quality::CheckResult;
use crate::domain::spec::{
    FieldError, FloeSpec, ManifestChain, ManifestScope, PlatformManifest, flatten_errors,
};
use crate::infrastructure::error::LoadError;
use super::salvage::deserialize_collecting;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};
use validator::Validate;

const SPEC_DOCUMENT: &str = "floe.yaml";
const MANIFEST_DOCUMENT: &str = "manifest.yaml";
const CHECK_RESULTS_DOCUMENT: &str = "check results";

// --- GENERIC LOGIC ---

fn read_document(document: &'static str, path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        document,
        path: path.to_path_buf(),
        source,
    })
}

/// Parses then validates a document, collecting every failing field:
/// type errors first, then derive-based rules, then the cross-field checks.
fn parse_document<T, F>(document: &'static str, yaml: &str, cross_field: F) -> Result<T, LoadError>
where
    T: DeserializeOwned + Validate,
    F: Fn(&T) -> Vec<FieldError>,
{
    let salvaged = deserialize_collecting::<T>(yaml)
        .map_err(|source| LoadError::Yaml { document, source })?;

    let mut errors = salvaged.type_errors.clone();
    if let Some(parsed) = &salvaged.value {
        let mut checked = match parsed.validate() {
            Ok(()) => Vec::new(),
            Err(e) => flatten_errors(&e),
        };
        checked.extend(cross_field(parsed));
        for error in checked {
            let path = salvaged.original_path(&error.path);
            if !salvaged.shadowed(&path) {
                errors.push(FieldError::new(path, error.message));
            }
        }
    }

    match salvaged.value {
        Some(parsed) if errors.is_empty() => Ok(parsed),
        _ => {
            errors.sort();
            errors.dedup();
            Err(LoadError::Validation { document, errors })
        }
    }
}

// --- FLOE SPEC ---

pub fn parse_spec(yaml: &str) -> Result<FloeSpec, LoadError> {
    parse_document(SPEC_DOCUMENT, yaml, FloeSpec::cross_field_errors)
}

#[instrument]
pub fn load_spec(path: &Path) -> Result<FloeSpec, LoadError> {
    let spec = parse_spec(&read_document(SPEC_DOCUMENT, path)?)?;
    info!(
        product = %spec.metadata.name,
        transforms = spec.transforms.len(),
        "Spec loaded"
    );
    Ok(spec)
}

// --- PLATFORM MANIFEST ---

pub fn parse_manifest(yaml: &str) -> Result<PlatformManifest, LoadError> {
    parse_document(MANIFEST_DOCUMENT, yaml, PlatformManifest::cross_field_errors)
}

#[instrument]
pub fn load_manifest(path: &Path) -> Result<PlatformManifest, LoadError> {
    let manifest = parse_manifest(&read_document(MANIFEST_DOCUMENT, path)?)?;
    info!(
        manifest = %manifest.metadata.name,
        scope = ?manifest.scope,
        "Manifest loaded"
    );
    Ok(manifest)
}

/// Loads a manifest and, for a domain manifest, its enterprise parent.
/// `parent_manifest` is resolved relative to the child file.
#[instrument]
pub fn load_manifest_chain(path: &Path) -> Result<ManifestChain, LoadError> {
    let leaf = load_manifest(path)?;
    let Some(parent_ref) = leaf.parent_manifest.clone() else {
        return Ok(ManifestChain::single(leaf));
    };

    let parent_path = parent_path(path, &parent_ref);
    debug!(parent = ?parent_path, "Following parent_manifest");
    if same_file(path, &parent_path) {
        return Err(LoadError::Inheritance {
            path: path.to_path_buf(),
            reason: "a manifest cannot be its own parent".into(),
        });
    }

    let parent = load_manifest(&parent_path)?;
    if parent.scope != Some(ManifestScope::Enterprise) || parent.parent_manifest.is_some() {
        return Err(LoadError::Inheritance {
            path: parent_path,
            reason: "the parent must be a root manifest with scope 'enterprise'".into(),
        });
    }

    ManifestChain::inherited(parent, leaf).map_err(|reason| LoadError::Inheritance {
        path: path.to_path_buf(),
        reason,
    })
}

// --- CHECK RESULTS ---

/// Observed check outcomes (a JSON or YAML list) fed to the quality scorer.
#[instrument]
pub fn load_check_results(path: &Path) -> Result<Vec<CheckResult>, LoadError> {
    let raw = read_document(CHECK_RESULTS_DOCUMENT, path)?;
    let results: Vec<CheckResult> =
        serde_yaml::from_str(&raw).map_err(|source| LoadError::Yaml {
            document: CHECK_RESULTS_DOCUMENT,
            source,
        })?;
    debug!(count = results.len(), "Check results loaded");
    Ok(results)
}

fn parent_path(child: &Path, parent_ref: &str) -> PathBuf {
    let parent_ref = Path::new(parent_ref);
    if parent_ref.is_absolute() {
        return parent_ref.to_path_buf();
    }
    child
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(parent_ref)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
