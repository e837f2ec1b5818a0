// floe-core/src/infrastructure/config/env.rs

// Environment layering, applied after loading:
// FLOE_ENFORCEMENT_LEVEL=strict floe compile ...

use crate::domain::governance::EnforcementLevel;
use crate::domain::spec::ManifestChain;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::EnvSource;
use tracing::info;

pub const ENV_ENFORCEMENT_LEVEL: &str = "FLOE_ENFORCEMENT_LEVEL";
pub const ENV_TARGET: &str = "FLOE_TARGET";
pub const DEFAULT_TARGET: &str = "dev";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub enforcement_level: Option<EnforcementLevel>,
    pub target: Option<String>,
}

impl EnvOverrides {
    pub fn from_env(env: &dyn EnvSource) -> Result<Self, InfrastructureError> {
        let enforcement_level = env
            .var(ENV_ENFORCEMENT_LEVEL)
            .filter(|v| !v.trim().is_empty())
            .map(|v| {
                v.parse::<EnforcementLevel>()
                    .map_err(|e| InfrastructureError::ConfigError(format!("{}: {}", ENV_ENFORCEMENT_LEVEL, e)))
            })
            .transpose()?;
        let target = env
            .var(ENV_TARGET)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        Ok(Self {
            enforcement_level,
            target,
        })
    }

    /// The level is set on every manifest of the chain, so that a domain
    /// manifest never looks weaker than its parent because of the override.
    pub fn apply(&self, chain: &mut ManifestChain) {
        if let Some(level) = self.enforcement_level {
            for manifest in chain.manifests_mut() {
                info!(
                    manifest = %manifest.metadata.name,
                    old = ?manifest.governance.policy_enforcement_level,
                    new = %level,
                    "Overriding enforcement level via ENV"
                );
                manifest.governance.policy_enforcement_level = Some(level);
            }
        }
    }

    pub fn target(&self) -> &str {
        self.target.as_deref().unwrap_or(DEFAULT_TARGET)
    }
}
