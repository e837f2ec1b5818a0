// floe-core/src/infrastructure/plugins/compute.rs

// Builtin compute targets. Each one only knows how to describe itself to
// dbt: the profile output goes into the compiled artifacts, nothing here
// ever opens a connection.

use crate::domain::plugin::{
    CapabilityKind, ComputePlugin, FloePlugin, PluginConfig, PluginError, ProfileContext,
    config_str, missing_string_keys,
};
use crate::domain::spec::MaterializationType;
use serde_json::{Map, Value, json};

const ALL_MATERIALIZATIONS: &[MaterializationType] = &[
    MaterializationType::View,
    MaterializationType::Table,
    MaterializationType::Incremental,
    MaterializationType::Ephemeral,
];

/// Rendered by dbt at run time, so credentials never land in the artifacts.
fn env_var_template(name: &str) -> Value {
    Value::String(format!("{{{{ env_var('{}') }}}}", name))
}

fn positive_int(config: &PluginConfig, key: &str) -> Option<String> {
    match config.get(key) {
        Some(v) if v.as_u64().is_none_or(|n| n == 0) => {
            Some(format!("'{}' must be a positive integer", key))
        }
        _ => None,
    }
}

// --- DUCKDB ---

#[derive(Debug, Default, Clone, Copy)]
pub struct DuckDbCompute;

impl DuckDbCompute {
    const DEFAULT_PATH: &'static str = ":memory:";
    const DEFAULT_THREADS: u64 = 4;
}

impl FloePlugin for DuckDbCompute {
    fn name(&self) -> &str {
        "duckdb"
    }

    fn version(&self) -> &str {
        "1.1.0"
    }

    fn capability(&self) -> CapabilityKind {
        CapabilityKind::Compute
    }

    fn description(&self) -> &str {
        "Embedded DuckDB, file-backed or in memory"
    }

    fn validate_config(&self, config: &PluginConfig) -> Vec<String> {
        let mut issues: Vec<String> = positive_int(config, "threads").into_iter().collect();
        if let Some(path) = config.get("path")
            && path.as_str().is_none_or(|p| p.trim().is_empty())
        {
            issues.push("'path' must be a non-empty string".into());
        }
        if let Some(ext) = config.get("extensions")
            && !ext
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string))
        {
            issues.push("'extensions' must be a list of strings".into());
        }
        issues
    }
}

impl ComputePlugin for DuckDbCompute {
    fn supported_materializations(&self) -> &[MaterializationType] {
        ALL_MATERIALIZATIONS
    }

    fn generate_dbt_profile(&self, ctx: &ProfileContext<'_>) -> Result<Value, PluginError> {
        let mut profile = Map::new();
        profile.insert("type".into(), json!("duckdb"));
        profile.insert(
            "path".into(),
            json!(config_str(ctx.config, "path").unwrap_or(Self::DEFAULT_PATH)),
        );
        profile.insert(
            "threads".into(),
            ctx.config
                .get("threads")
                .cloned()
                .unwrap_or_else(|| json!(Self::DEFAULT_THREADS)),
        );
        if let Some(ext) = ctx.config.get("extensions") {
            profile.insert("extensions".into(), ext.clone());
        }
        Ok(Value::Object(profile))
    }
}

// --- SNOWFLAKE ---

#[derive(Debug, Default, Clone, Copy)]
pub struct SnowflakeCompute;

impl SnowflakeCompute {
    const REQUIRED: [&'static str; 4] = ["account", "user", "database", "warehouse"];
}

impl FloePlugin for SnowflakeCompute {
    fn name(&self) -> &str {
        "snowflake"
    }

    fn version(&self) -> &str {
        "1.0.2"
    }

    fn capability(&self) -> CapabilityKind {
        CapabilityKind::Compute
    }

    fn description(&self) -> &str {
        "Snowflake warehouse through dbt-snowflake"
    }

    fn validate_config(&self, config: &PluginConfig) -> Vec<String> {
        let mut issues = missing_string_keys(config, &Self::REQUIRED);
        issues.extend(positive_int(config, "threads"));
        issues
    }
}

impl ComputePlugin for SnowflakeCompute {
    fn supported_materializations(&self) -> &[MaterializationType] {
        ALL_MATERIALIZATIONS
    }

    /// Keys absent from the config fall back to `SNOWFLAKE_<KEY>` env vars,
    /// which lets an alternate compute be profiled without its own config.
    fn generate_dbt_profile(&self, ctx: &ProfileContext<'_>) -> Result<Value, PluginError> {
        let mut profile = Map::new();
        profile.insert("type".into(), json!("snowflake"));
        for key in Self::REQUIRED.iter().chain(["role"].iter()) {
            let value = match config_str(ctx.config, key) {
                Some(v) => json!(v),
                None => env_var_template(&format!("SNOWFLAKE_{}", key.to_uppercase())),
            };
            profile.insert((*key).to_string(), value);
        }
        profile.insert(
            "password".into(),
            ctx.config
                .get("password")
                .cloned()
                .unwrap_or_else(|| env_var_template("SNOWFLAKE_PASSWORD")),
        );
        profile.insert(
            "schema".into(),
            json!(config_str(ctx.config, "schema").unwrap_or(ctx.product)),
        );
        profile.insert(
            "threads".into(),
            ctx.config.get("threads").cloned().unwrap_or_else(|| json!(8)),
        );
        Ok(Value::Object(profile))
    }
}

// --- SPARK ---

#[derive(Debug, Default, Clone, Copy)]
pub struct SparkCompute;

impl SparkCompute {
    const METHODS: [&'static str; 3] = ["session", "thrift", "http"];
}

impl FloePlugin for SparkCompute {
    fn name(&self) -> &str {
        "spark"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn capability(&self) -> CapabilityKind {
        CapabilityKind::Compute
    }

    fn description(&self) -> &str {
        "Apache Spark through dbt-spark (session, thrift or http)"
    }

    fn validate_config(&self, config: &PluginConfig) -> Vec<String> {
        let mut issues = Vec::new();
        let method = config_str(config, "method").unwrap_or("session");
        if !Self::METHODS.contains(&method) {
            issues.push(format!(
                "'method' must be one of {}, got '{}'",
                Self::METHODS.join(", "),
                method
            ));
        } else if method != "session" {
            issues.extend(missing_string_keys(config, &["host"]));
        }
        issues.extend(positive_int(config, "port"));
        issues
    }
}

impl ComputePlugin for SparkCompute {
    // Spark has no cheap way to inline CTEs across sessions.
    fn supported_materializations(&self) -> &[MaterializationType] {
        &[
            MaterializationType::View,
            MaterializationType::Table,
            MaterializationType::Incremental,
        ]
    }

    fn generate_dbt_profile(&self, ctx: &ProfileContext<'_>) -> Result<Value, PluginError> {
        let method = config_str(ctx.config, "method").unwrap_or("session");
        let mut profile = Map::new();
        profile.insert("type".into(), json!("spark"));
        profile.insert("method".into(), json!(method));
        profile.insert(
            "schema".into(),
            json!(config_str(ctx.config, "schema").unwrap_or(ctx.product)),
        );
        if method == "session" {
            profile.insert("host".into(), json!("NA"));
        } else {
            let host = config_str(ctx.config, "host").ok_or_else(|| PluginError::InvalidConfig {
                kind: CapabilityKind::Compute,
                name: self.name().to_string(),
                issues: vec!["missing required key 'host'".into()],
            })?;
            profile.insert("host".into(), json!(host));
            profile.insert(
                "port".into(),
                ctx.config.get("port").cloned().unwrap_or_else(|| json!(10001)),
            );
        }
        Ok(Value::Object(profile))
    }
}
