// floe-core/src/infrastructure/plugins/lineage.rs

use crate::domain::plugin::{
    CapabilityKind, FloePlugin, LineageBackendPlugin, PluginConfig, config_str,
    missing_string_keys,
};
use serde_json::{Value, json};

/// OpenLineage events shipped to a Marquez server over HTTP.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarquezLineage;

impl MarquezLineage {
    const DEFAULT_ENDPOINT: &'static str = "api/v1/lineage";
}

impl FloePlugin for MarquezLineage {
    fn name(&self) -> &str {
        "marquez"
    }

    fn version(&self) -> &str {
        "0.5.0"
    }

    fn capability(&self) -> CapabilityKind {
        CapabilityKind::LineageBackend
    }

    fn description(&self) -> &str {
        "Marquez (OpenLineage HTTP transport)"
    }

    fn validate_config(&self, config: &PluginConfig) -> Vec<String> {
        let mut issues = missing_string_keys(config, &["url"]);
        if let Some(timeout) = config.get("timeout_seconds")
            && timeout.as_u64().is_none_or(|t| t == 0)
        {
            issues.push("'timeout_seconds' must be a positive integer".into());
        }
        issues
    }
}

impl LineageBackendPlugin for MarquezLineage {
    /// `<domain>.<product>` in mesh mode, the bare product otherwise.
    fn namespace(&self, product: &str, domain: Option<&str>) -> String {
        match domain {
            Some(domain) => format!("{}.{}", domain, product),
            None => product.to_string(),
        }
    }

    fn transport_config(&self, config: &PluginConfig) -> Value {
        let mut transport = json!({
            "type": "http",
            "url": config_str(config, "url").unwrap_or_default().trim_end_matches('/'),
            "endpoint": config_str(config, "endpoint").unwrap_or(Self::DEFAULT_ENDPOINT),
            "timeout": config.get("timeout_seconds").cloned().unwrap_or_else(|| json!(5)),
        });
        if let Some(api_key) = config.get("api_key") {
            transport["auth"] = json!({ "type": "api_key", "apiKey": api_key });
        }
        transport
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace() {
        assert_eq!(MarquezLineage.namespace("orders", Some("sales")), "sales.orders");
        assert_eq!(MarquezLineage.namespace("orders", None), "orders");
    }

    #[test]
    fn test_transport_config() {
        let config: PluginConfig = serde_json::from_value(json!({
            "url": "http://marquez:5000/",
            "api_key": "env_var('MARQUEZ_API_KEY')"
        }))
        .unwrap();
        assert!(MarquezLineage.validate_config(&config).is_empty());
        let transport = MarquezLineage.transport_config(&config);
        assert_eq!(transport["url"], json!("http://marquez:5000"));
        assert_eq!(transport["endpoint"], json!("api/v1/lineage"));
        assert_eq!(transport["auth"]["apiKey"], json!("env_var('MARQUEZ_API_KEY')"));
    }

    #[test]
    fn test_url_is_required() {
        assert_eq!(
            MarquezLineage.validate_config(&PluginConfig::new()),
            vec!["missing required key 'url'"]
        );
    }
}
