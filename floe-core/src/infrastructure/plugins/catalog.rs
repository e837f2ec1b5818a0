// floe-core/src/infrastructure/plugins/catalog.rs

use crate::domain::plugin::{
    CapabilityKind, CatalogConnection, CatalogPlugin, FloePlugin, PluginConfig, PluginError,
    config_str, missing_string_keys,
};
use serde_json::Value;
use std::collections::BTreeMap;

fn invalid(name: &str, issues: Vec<String>) -> PluginError {
    PluginError::InvalidConfig {
        kind: CapabilityKind::Catalog,
        name: name.to_string(),
        issues,
    }
}

/// Iceberg REST catalog served by Apache Polaris.
#[derive(Debug, Default, Clone, Copy)]
pub struct PolarisCatalog;

impl FloePlugin for PolarisCatalog {
    fn name(&self) -> &str {
        "polaris"
    }

    fn version(&self) -> &str {
        "0.9.0"
    }

    fn capability(&self) -> CapabilityKind {
        CapabilityKind::Catalog
    }

    fn description(&self) -> &str {
        "Apache Polaris (Iceberg REST catalog)"
    }

    fn validate_config(&self, config: &PluginConfig) -> Vec<String> {
        let mut issues = missing_string_keys(config, &["uri", "warehouse"]);
        if let Some(uri) = config_str(config, "uri")
            && !(uri.starts_with("http://") || uri.starts_with("https://"))
        {
            issues.push(format!("'uri' must be an http(s) URL, got '{}'", uri));
        }
        issues
    }
}

impl CatalogPlugin for PolarisCatalog {
    fn connection_config(&self, config: &PluginConfig) -> Result<CatalogConnection, PluginError> {
        let issues = self.validate_config(config);
        if !issues.is_empty() {
            return Err(invalid(self.name(), issues));
        }
        let uri = config_str(config, "uri").unwrap_or_default();
        let mut properties = BTreeMap::new();
        properties.insert("type".to_string(), Value::String("rest".into()));
        // credentials stay as references, the secret scanner already vetted them
        for key in ["credential", "scope"] {
            if let Some(v) = config.get(key) {
                properties.insert(key.to_string(), v.clone());
            }
        }
        Ok(CatalogConnection {
            catalog: config_str(config, "catalog_name")
                .unwrap_or("polaris")
                .to_string(),
            uri: uri.trim_end_matches('/').to_string(),
            warehouse: config_str(config, "warehouse").map(String::from),
            properties,
        })
    }
}

/// AWS Glue Data Catalog; the URI is derived from the region.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlueCatalog;

impl FloePlugin for GlueCatalog {
    fn name(&self) -> &str {
        "glue"
    }

    fn version(&self) -> &str {
        "0.4.1"
    }

    fn capability(&self) -> CapabilityKind {
        CapabilityKind::Catalog
    }

    fn description(&self) -> &str {
        "AWS Glue Data Catalog"
    }

    fn validate_config(&self, config: &PluginConfig) -> Vec<String> {
        let mut issues = missing_string_keys(config, &["region"]);
        if let Some(account) = config.get("account_id")
            && !account
                .as_str()
                .is_some_and(|a| a.len() == 12 && a.chars().all(|c| c.is_ascii_digit()))
        {
            issues.push("'account_id' must be a 12 digit string".into());
        }
        issues
    }
}

impl CatalogPlugin for GlueCatalog {
    fn connection_config(&self, config: &PluginConfig) -> Result<CatalogConnection, PluginError> {
        let issues = self.validate_config(config);
        if !issues.is_empty() {
            return Err(invalid(self.name(), issues));
        }
        let region = config_str(config, "region").unwrap_or_default();
        let mut properties = BTreeMap::new();
        properties.insert("type".to_string(), Value::String("glue".into()));
        properties.insert("region".to_string(), Value::String(region.to_string()));
        if let Some(account) = config_str(config, "account_id") {
            properties.insert("catalog_id".to_string(), Value::String(account.to_string()));
        }
        Ok(CatalogConnection {
            catalog: "glue".into(),
            uri: format!("https://glue.{}.amazonaws.com", region),
            warehouse: config_str(config, "warehouse").map(String::from),
            properties,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;

    fn config(value: Value) -> PluginConfig {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_polaris_connection() -> Result<()> {
        let cfg = config(json!({
            "uri": "https://polaris.acme.io/api/catalog/",
            "warehouse": "lakehouse",
            "credential": { "secret_ref": "polaris-client" }
        }));
        let conn = PolarisCatalog.connection_config(&cfg)?;
        assert_eq!(conn.catalog, "polaris");
        assert_eq!(conn.uri, "https://polaris.acme.io/api/catalog");
        assert_eq!(conn.warehouse.as_deref(), Some("lakehouse"));
        assert_eq!(conn.properties["credential"], json!({ "secret_ref": "polaris-client" }));
        Ok(())
    }

    #[test]
    fn test_polaris_rejects_bad_uri() {
        let cfg = config(json!({ "uri": "polaris:8181", "warehouse": "w" }));
        let err = PolarisCatalog.connection_config(&cfg).unwrap_err();
        assert!(matches!(err, PluginError::InvalidConfig { ref issues, .. } if issues.len() == 1));
    }

    #[test]
    fn test_glue_connection() -> Result<()> {
        let cfg = config(json!({ "region": "eu-west-1", "account_id": "123456789012" }));
        let conn = GlueCatalog.connection_config(&cfg)?;
        assert_eq!(conn.uri, "https://glue.eu-west-1.amazonaws.com");
        assert_eq!(conn.properties["catalog_id"], json!("123456789012"));

        let bad = config(json!({ "account_id": "12" }));
        assert_eq!(GlueCatalog.validate_config(&bad).len(), 2);
        Ok(())
    }
}
