// floe-core/src/domain/resolution/inheritance.rs

// Enterprise -> domain merge. A domain manifest can narrow what its parent
// allows and tighten governance, never the other way round.

use super::error::ResolutionError;
use crate::domain::governance::{
    DocumentationConfig, GovernanceConfig, NamingConfig, QualityGates, RbacConfig,
    SecretScanningConfig, TierGate,
};
use crate::domain::spec::{ManifestChain, PlatformManifest, QualityTier};
use tracing::{debug, info, instrument};

/// Effective manifest of a chain. A single manifest is returned as is.
#[instrument(skip_all, fields(chain = ?chain.names()))]
pub fn effective_manifest(chain: &ManifestChain) -> Result<PlatformManifest, ResolutionError> {
    let Some(parent) = chain.parent() else {
        return Ok(chain.leaf().clone());
    };
    let child = chain.leaf();
    let manifest = child.metadata.name.as_str();

    let mut merged = child.clone();

    // Plugins: the child picks inside the parent's approved lists
    merged.plugins = parent.plugins.clone();
    for (capability, selection) in &child.plugins {
        if let Some(approved) = parent.approved(*capability)
            && !approved.contains(&selection.plugin_type)
        {
            return Err(ResolutionError::PlanNotApproved {
                capability: *capability,
                plugin: selection.plugin_type.clone(),
                approved: approved.to_vec(),
            });
        }
        merged.plugins.insert(*capability, selection.clone());
    }

    // Approved lists: subsets only
    merged.approved_plugins = parent.approved_plugins.clone();
    for (capability, names) in &child.approved_plugins {
        if let Some(allowed) = parent.approved(*capability)
            && let Some(extra) = names.iter().find(|n| !allowed.contains(n))
        {
            return Err(weakened(
                manifest,
                format!("approved_plugins.{}", capability),
                format!("'{}' is not approved by the parent", extra),
            ));
        }
        merged.approved_plugins.insert(*capability, names.clone());
    }

    merged.governance = merge_governance(manifest, &parent.governance, &child.governance)?;
    info!(
        parent = %parent.metadata.name,
        child = manifest,
        "Merged manifest inheritance chain"
    );
    Ok(merged)
}

fn weakened(manifest: &str, field: impl Into<String>, reason: impl Into<String>) -> ResolutionError {
    ResolutionError::GovernanceWeakened {
        manifest: manifest.to_string(),
        field: field.into(),
        reason: reason.into(),
    }
}

pub fn merge_governance(
    manifest: &str,
    parent: &GovernanceConfig,
    child: &GovernanceConfig,
) -> Result<GovernanceConfig, ResolutionError> {
    let mut merged = parent.clone();

    if let Some(level) = child.policy_enforcement_level {
        if level < parent.enforcement_level() {
            return Err(weakened(
                manifest,
                "governance.policy_enforcement_level",
                format!("{} is weaker than the inherited {}", level, parent.enforcement_level()),
            ));
        }
        merged.policy_enforcement_level = Some(level);
    }

    merged.naming = merge_naming(manifest, parent.naming.as_ref(), child.naming.as_ref())?;
    merged.quality_gates =
        merge_gates(manifest, parent.quality_gates.as_ref(), child.quality_gates.as_ref())?;
    merged.documentation = merge_documentation(
        manifest,
        parent.documentation.as_ref(),
        child.documentation.as_ref(),
    )?;

    merged.custom_rules.extend(child.custom_rules.iter().cloned());
    merged.policy_overrides.extend(child.policy_overrides.iter().cloned());

    if child.quality_scoring.is_some() {
        merged.quality_scoring = child.quality_scoring;
    }

    merged.rbac = merge_rbac(manifest, parent.rbac.as_ref(), child.rbac.as_ref())?;
    merged.secret_scanning = merge_secret_scanning(
        manifest,
        parent.secret_scanning.as_ref(),
        child.secret_scanning.as_ref(),
    )?;

    debug!(
        custom_rules = merged.custom_rules.len(),
        overrides = merged.policy_overrides.len(),
        "Governance merged"
    );
    Ok(merged)
}

fn merge_naming(
    manifest: &str,
    parent: Option<&NamingConfig>,
    child: Option<&NamingConfig>,
) -> Result<Option<NamingConfig>, ResolutionError> {
    let (parent, child) = match (parent, child) {
        (p, None) => return Ok(p.cloned()),
        (None, Some(c)) => return Ok(Some(c.clone())),
        (Some(p), Some(c)) => (p, c),
    };
    if child.convention.is_some() && child.convention() != parent.convention() {
        return Err(weakened(
            manifest,
            "governance.naming.convention",
            "the inherited naming convention cannot be replaced",
        ));
    }
    if child.enforcement.is_some() && child.enforcement() < parent.enforcement() {
        return Err(weakened(
            manifest,
            "governance.naming.enforcement",
            format!(
                "{} is weaker than the inherited {}",
                child.enforcement(),
                parent.enforcement()
            ),
        ));
    }
    let mut merged = parent.clone();
    merged.enforcement = child.enforcement.or(parent.enforcement);
    for pattern in &child.custom_patterns {
        if !merged.custom_patterns.contains(pattern) {
            merged.custom_patterns.push(pattern.clone());
        }
    }
    Ok(Some(merged))
}

fn at_least(
    manifest: &str,
    field: String,
    parent: Option<f64>,
    child: Option<f64>,
) -> Result<Option<f64>, ResolutionError> {
    match (parent, child) {
        (Some(p), Some(c)) if c < p => Err(weakened(
            manifest,
            field,
            format!("{} is below the inherited {}", c, p),
        )),
        (p, c) => Ok(c.or(p)),
    }
}

fn merge_gates(
    manifest: &str,
    parent: Option<&QualityGates>,
    child: Option<&QualityGates>,
) -> Result<Option<QualityGates>, ResolutionError> {
    let (parent, child) = match (parent, child) {
        (p, None) => return Ok(p.cloned()),
        (None, Some(c)) => return Ok(Some(c.clone())),
        (Some(p), Some(c)) => (p, c),
    };

    let mut merged = QualityGates {
        min_test_coverage: at_least(
            manifest,
            "governance.quality_gates.min_test_coverage".into(),
            parent.min_test_coverage,
            child.min_test_coverage,
        )?,
        ..Default::default()
    };

    for tier in [QualityTier::Bronze, QualityTier::Silver, QualityTier::Gold] {
        let gate = match (parent.gate(tier), child.gate(tier)) {
            (None, None) => None,
            (Some(p), None) => Some(p.clone()),
            (None, Some(c)) => Some(c.clone()),
            (Some(p), Some(c)) => {
                let prefix = format!("governance.quality_gates.{}", tier);
                let mut required_tests = p.required_tests.clone();
                for test in &c.required_tests {
                    if !required_tests.contains(test) {
                        required_tests.push(test.clone());
                    }
                }
                Some(TierGate {
                    min_test_coverage: at_least(
                        manifest,
                        format!("{}.min_test_coverage", prefix),
                        p.min_test_coverage,
                        c.min_test_coverage,
                    )?,
                    required_tests,
                    min_score: at_least(
                        manifest,
                        format!("{}.min_score", prefix),
                        p.min_score,
                        c.min_score,
                    )?,
                })
            }
        };
        *merged.gate_mut(tier) = gate;
    }
    Ok(Some(merged))
}

fn still_required(
    manifest: &str,
    field: &str,
    parent: Option<bool>,
    child: Option<bool>,
) -> Result<Option<bool>, ResolutionError> {
    if parent == Some(true) && child == Some(false) {
        return Err(weakened(
            manifest,
            field,
            "an inherited requirement cannot be turned off",
        ));
    }
    Ok(child.or(parent))
}

fn merge_documentation(
    manifest: &str,
    parent: Option<&DocumentationConfig>,
    child: Option<&DocumentationConfig>,
) -> Result<Option<DocumentationConfig>, ResolutionError> {
    let (parent, child) = match (parent, child) {
        (p, None) => return Ok(p.cloned()),
        (None, Some(c)) => return Ok(Some(c.clone())),
        (Some(p), Some(c)) => (p, c),
    };
    Ok(Some(DocumentationConfig {
        require_model_descriptions: still_required(
            manifest,
            "governance.documentation.require_model_descriptions",
            parent.require_model_descriptions,
            child.require_model_descriptions,
        )?,
        require_column_descriptions: still_required(
            manifest,
            "governance.documentation.require_column_descriptions",
            parent.require_column_descriptions,
            child.require_column_descriptions,
        )?,
        placeholder_patterns: child
            .placeholder_patterns
            .clone()
            .or_else(|| parent.placeholder_patterns.clone()),
    }))
}

fn merge_rbac(
    manifest: &str,
    parent: Option<&RbacConfig>,
    child: Option<&RbacConfig>,
) -> Result<Option<RbacConfig>, ResolutionError> {
    let (parent, child) = match (parent, child) {
        (p, None) => return Ok(p.cloned()),
        (None, Some(c)) => return Ok(Some(c.clone())),
        (Some(p), Some(c)) => (p, c),
    };
    let enabled = still_required(manifest, "governance.rbac.enabled", parent.enabled, child.enabled)?;
    let required_role = match (&parent.required_role, &child.required_role) {
        (Some(p), Some(c)) if p != c => {
            return Err(weakened(
                manifest,
                "governance.rbac.required_role",
                format!("the inherited role '{}' cannot be replaced by '{}'", p, c),
            ));
        }
        (p, c) => c.clone().or_else(|| p.clone()),
    };
    Ok(Some(RbacConfig {
        enabled,
        required_role,
    }))
}

fn merge_secret_scanning(
    manifest: &str,
    parent: Option<&SecretScanningConfig>,
    child: Option<&SecretScanningConfig>,
) -> Result<Option<SecretScanningConfig>, ResolutionError> {
    let (parent, child) = match (parent, child) {
        (p, None) => return Ok(p.cloned()),
        (None, Some(c)) => return Ok(Some(c.clone())),
        (Some(p), Some(c)) => (p, c),
    };
    let enabled = still_required(
        manifest,
        "governance.secret_scanning.enabled",
        parent.enabled,
        child.enabled,
    )?;
    let mut sensitive_keys = parent.sensitive_keys.clone();
    for key in &child.sensitive_keys {
        if !sensitive_keys.contains(key) {
            sensitive_keys.push(key.clone());
        }
    }
    Ok(Some(SecretScanningConfig {
        enabled,
        sensitive_keys,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::governance::{CustomRule, EnforcementLevel};
    use crate::domain::plugin::CapabilityKind;
    use crate::domain::spec::ManifestScope;
    use anyhow::Result;

    fn enterprise() -> PlatformManifest {
        let mut m = PlatformManifest::new("acme", "platform@acme.io")
            .with_plugin(CapabilityKind::Compute, "snowflake")
            .with_approved(CapabilityKind::Compute, &["snowflake", "duckdb"]);
        m.scope = Some(ManifestScope::Enterprise);
        m.governance.policy_enforcement_level = Some(EnforcementLevel::Warn);
        m.governance.custom_rules = vec![CustomRule::RequireMetaField {
            field: "owner".into(),
            applies_to: None,
        }];
        m.governance.quality_gates = Some(QualityGates {
            min_test_coverage: Some(50.0),
            ..Default::default()
        });
        m
    }

    fn domain() -> PlatformManifest {
        let mut m = PlatformManifest::new("sales", "sales@acme.io");
        m.scope = Some(ManifestScope::Domain);
        m.parent_manifest = Some("../enterprise.yaml".into());
        m
    }

    fn chain(child: PlatformManifest) -> ManifestChain {
        ManifestChain::inherited(enterprise(), child).unwrap()
    }

    #[test]
    fn test_domain_inherits_and_tightens() -> Result<()> {
        let mut child = domain().with_plugin(CapabilityKind::Compute, "duckdb");
        child.governance.policy_enforcement_level = Some(EnforcementLevel::Strict);
        child.governance.custom_rules = vec![CustomRule::RequireTagsForPrefix {
            prefix: "fct_".into(),
            required_tags: vec!["finance".into()],
        }];
        child.governance.quality_gates = Some(QualityGates {
            min_test_coverage: Some(80.0),
            ..Default::default()
        });

        let merged = effective_manifest(&chain(child))?;
        assert_eq!(merged.metadata.name, "sales");
        assert_eq!(merged.plugins[&CapabilityKind::Compute].plugin_type, "duckdb");
        assert_eq!(merged.governance.enforcement_level(), EnforcementLevel::Strict);
        assert_eq!(merged.governance.custom_rules.len(), 2);
        assert!(matches!(
            merged.governance.custom_rules[0],
            CustomRule::RequireMetaField { .. }
        ));
        assert_eq!(
            merged.governance.quality_gates.unwrap().min_test_coverage,
            Some(80.0)
        );
        Ok(())
    }

    #[test]
    fn test_child_selection_outside_parent_approval() {
        let child = domain().with_plugin(CapabilityKind::Compute, "spark");
        let err = effective_manifest(&chain(child)).unwrap_err();
        assert!(matches!(
            err,
            ResolutionError::PlanNotApproved { capability: CapabilityKind::Compute, ref plugin, .. } if plugin == "spark"
        ));
    }

    #[test]
    fn test_child_cannot_widen_approval_or_loosen_governance() {
        let wider = domain().with_approved(CapabilityKind::Compute, &["duckdb", "spark"]);
        assert!(matches!(
            effective_manifest(&chain(wider)).unwrap_err(),
            ResolutionError::GovernanceWeakened { ref field, .. } if field == "approved_plugins.compute"
        ));

        let mut looser = domain();
        looser.governance.policy_enforcement_level = Some(EnforcementLevel::Off);
        assert!(matches!(
            effective_manifest(&chain(looser)).unwrap_err(),
            ResolutionError::GovernanceWeakened { .. }
        ));

        let mut lower = domain();
        lower.governance.quality_gates = Some(QualityGates {
            min_test_coverage: Some(20.0),
            ..Default::default()
        });
        assert!(effective_manifest(&chain(lower)).is_err());
    }

    #[test]
    fn test_narrower_approval_is_accepted() -> Result<()> {
        let narrower = domain().with_approved(CapabilityKind::Compute, &["snowflake"]);
        let merged = effective_manifest(&chain(narrower))?;
        assert_eq!(
            merged.approved(CapabilityKind::Compute),
            Some(&["snowflake".to_string()][..])
        );
        assert_eq!(
            merged.plugins[&CapabilityKind::Compute].plugin_type,
            "snowflake"
        );
        Ok(())
    }

    #[test]
    fn test_single_manifest_is_unchanged() -> Result<()> {
        let m = PlatformManifest::new("solo", "me").with_plugin(CapabilityKind::Compute, "duckdb");
        assert_eq!(effective_manifest(&ManifestChain::single(m.clone()))?, m);
        Ok(())
    }
}
