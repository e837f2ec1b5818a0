// floe-core/src/domain/resolution/secrets.rs

use super::error::ResolutionError;
use crate::domain::plugin::{CapabilityKind, PluginConfig};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

pub const SENSITIVE_KEYS: [&str; 7] = [
    "password",
    "secret",
    "token",
    "private_key",
    "api_key",
    "access_key",
    "passphrase",
];

fn env_var_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*(\{\{\s*)?env_var\(\s*['"][A-Za-z_][A-Za-z0-9_]*['"]\s*(,[^)]*)?\)\s*(\}\})?\s*$"#)
            .unwrap_or_else(|_| Regex::new("$^").unwrap_or_else(|_| unreachable!()))
    })
}

/// `password` or `snowflake_password` are sensitive, `password_policy` is not.
fn is_sensitive(key: &str, extra: &[String]) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE_KEYS
        .iter()
        .copied()
        .chain(extra.iter().map(String::as_str))
        .any(|s| key == s || key.ends_with(&format!("_{}", s)))
}

/// A value that does not leak anything: a reference or nothing at all.
fn is_reference(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty() || env_var_re().is_match(s),
        Value::Object(map) => map.contains_key("secret_ref") || map.contains_key("env_var"),
        _ => false,
    }
}

/// Rejects plaintext values under sensitive keys, at any nesting depth.
pub fn scan_config(
    capability: CapabilityKind,
    config: &PluginConfig,
    extra_keys: &[String],
) -> Result<(), ResolutionError> {
    for (key, value) in config {
        scan_value(capability, key, value, extra_keys)?;
    }
    Ok(())
}

fn scan_value(
    capability: CapabilityKind,
    path: &str,
    value: &Value,
    extra_keys: &[String],
) -> Result<(), ResolutionError> {
    let leaf = path.rsplit('.').next().unwrap_or(path);
    if is_sensitive(leaf, extra_keys) && !is_reference(value) {
        return Err(ResolutionError::PlaintextSecret {
            capability,
            key: path.to_string(),
        });
    }
    if let Value::Object(map) = value {
        for (key, nested) in map {
            scan_value(capability, &format!("{}.{}", path, key), nested, extra_keys)?;
        }
    }
    Ok(())
}
