// floe-core/src/infrastructure/plugins/descriptors.rs

// Capabilities the compiler does not drive itself (orchestration, storage,
// ingestion, ...). They only need to exist in the registry so selections can
// be approved, validated and recorded in the artifacts.

use crate::domain::plugin::{CapabilityKind, FloePlugin, PluginConfig, missing_string_keys};

#[derive(Debug, Clone, Copy)]
pub struct PluginDescriptor {
    pub name: &'static str,
    pub version: &'static str,
    pub capability: CapabilityKind,
    pub description: &'static str,
    pub required_keys: &'static [&'static str],
}

impl FloePlugin for PluginDescriptor {
    fn name(&self) -> &str {
        self.name
    }

    fn version(&self) -> &str {
        self.version
    }

    fn capability(&self) -> CapabilityKind {
        self.capability
    }

    fn description(&self) -> &str {
        self.description
    }

    fn validate_config(&self, config: &PluginConfig) -> Vec<String> {
        missing_string_keys(config, self.required_keys)
    }
}

pub const DESCRIPTORS: &[PluginDescriptor] = &[
    PluginDescriptor {
        name: "dagster",
        version: "1.8.0",
        capability: CapabilityKind::Orchestrator,
        description: "Dagster software-defined assets",
        required_keys: &[],
    },
    PluginDescriptor {
        name: "s3",
        version: "1.0.0",
        capability: CapabilityKind::Storage,
        description: "S3-compatible object storage",
        required_keys: &["bucket"],
    },
    PluginDescriptor {
        name: "dlt",
        version: "1.2.0",
        capability: CapabilityKind::Ingestion,
        description: "dlt pipelines",
        required_keys: &[],
    },
    PluginDescriptor {
        name: "cube",
        version: "0.36.0",
        capability: CapabilityKind::SemanticLayer,
        description: "Cube semantic layer",
        required_keys: &[],
    },
    PluginDescriptor {
        name: "jaeger",
        version: "1.60.0",
        capability: CapabilityKind::TelemetryBackend,
        description: "Jaeger through OTLP",
        required_keys: &["endpoint"],
    },
    PluginDescriptor {
        name: "great_expectations",
        version: "1.0.0",
        capability: CapabilityKind::Quality,
        description: "Great Expectations suites",
        required_keys: &[],
    },
    PluginDescriptor {
        name: "dbt_expectations",
        version: "0.10.0",
        capability: CapabilityKind::Quality,
        description: "dbt-expectations test macros",
        required_keys: &[],
    },
    PluginDescriptor {
        name: "k8s",
        version: "1.0.0",
        capability: CapabilityKind::Secrets,
        description: "Kubernetes secrets",
        required_keys: &[],
    },
    PluginDescriptor {
        name: "env",
        version: "1.0.0",
        capability: CapabilityKind::Secrets,
        description: "Secrets read from environment variables",
        required_keys: &[],
    },
];
