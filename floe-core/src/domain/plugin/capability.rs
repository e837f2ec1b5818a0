// floe-core/src/domain/plugin/capability.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A pluggable role of the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    Compute,
    Orchestrator,
    Catalog,
    Storage,
    Ingestion,
    SemanticLayer,
    LineageBackend,
    TelemetryBackend,
    Quality,
    Identity,
    Secrets,
}

impl CapabilityKind {
    pub const ALL: [CapabilityKind; 11] = [
        Self::Compute,
        Self::Orchestrator,
        Self::Catalog,
        Self::Storage,
        Self::Ingestion,
        Self::SemanticLayer,
        Self::LineageBackend,
        Self::TelemetryBackend,
        Self::Quality,
        Self::Identity,
        Self::Secrets,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compute => "compute",
            Self::Orchestrator => "orchestrator",
            Self::Catalog => "catalog",
            Self::Storage => "storage",
            Self::Ingestion => "ingestion",
            Self::SemanticLayer => "semantic_layer",
            Self::LineageBackend => "lineage_backend",
            Self::TelemetryBackend => "telemetry_backend",
            Self::Quality => "quality",
            Self::Identity => "identity",
            Self::Secrets => "secrets",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapabilityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Unknown capability '{}'", s))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_round_trips_through_str() {
        for kind in CapabilityKind::ALL {
            assert_eq!(kind.as_str().parse::<CapabilityKind>().unwrap(), kind);
        }
        assert!("warehouse".parse::<CapabilityKind>().is_err());
    }

    #[test]
    fn test_capability_yaml_keys_are_snake_case() {
        let kind: CapabilityKind = serde_yaml::from_str("lineage_backend").unwrap();
        assert_eq!(kind, CapabilityKind::LineageBackend);
    }
}
