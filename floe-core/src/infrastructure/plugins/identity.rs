// floe-core/src/infrastructure/plugins/identity.rs

// Compilation runs offline: identity plugins never call their provider.
// They read the credentials a CI job (or a developer shell) exported and
// turn them into a Principal for the RBAC gate.

use crate::domain::identity::{IdentityError, Principal};
use crate::domain::plugin::{
    CapabilityKind, FloePlugin, IdentityPlugin, PluginConfig, config_str, missing_string_keys,
};
use crate::ports::EnvSource;

pub const ENV_TOKEN: &str = "FLOE_TOKEN";
pub const ENV_PRINCIPAL: &str = "FLOE_PRINCIPAL";
pub const ENV_ROLES: &str = "FLOE_ROLES";

fn required_var(env: &dyn EnvSource, key: &str) -> Result<String, IdentityError> {
    env.var(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| IdentityError::MissingCredentials {
            missing: key.to_string(),
        })
}

/// Comma separated, blanks dropped, sorted for stable output.
fn parse_roles(raw: Option<String>) -> Vec<String> {
    let mut roles: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(String::from)
        .collect();
    roles.sort();
    roles.dedup();
    roles
}

// --- ENV ---

/// Default identity provider, used when RBAC is on and the manifest selects
/// no identity plugin.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvIdentity;

impl FloePlugin for EnvIdentity {
    fn name(&self) -> &str {
        "env"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn capability(&self) -> CapabilityKind {
        CapabilityKind::Identity
    }

    fn description(&self) -> &str {
        "Principal and roles from FLOE_TOKEN / FLOE_PRINCIPAL / FLOE_ROLES"
    }
}

impl IdentityPlugin for EnvIdentity {
    fn authenticate(
        &self,
        _config: &PluginConfig,
        env: &dyn EnvSource,
    ) -> Result<Principal, IdentityError> {
        required_var(env, ENV_TOKEN)?;
        Ok(Principal {
            name: required_var(env, ENV_PRINCIPAL)?,
            roles: parse_roles(env.var(ENV_ROLES)),
        })
    }
}

// --- KEYCLOAK ---

/// Keycloak realm. The token exchange happens upstream; roles come in as
/// `FLOE_ROLES`, where client roles are written `<client_id>:<role>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeycloakIdentity;

impl FloePlugin for KeycloakIdentity {
    fn name(&self) -> &str {
        "keycloak"
    }

    fn version(&self) -> &str {
        "0.3.0"
    }

    fn capability(&self) -> CapabilityKind {
        CapabilityKind::Identity
    }

    fn description(&self) -> &str {
        "Keycloak realm and client roles"
    }

    fn validate_config(&self, config: &PluginConfig) -> Vec<String> {
        missing_string_keys(config, &["url", "realm", "client_id"])
    }
}

impl IdentityPlugin for KeycloakIdentity {
    fn authenticate(
        &self,
        config: &PluginConfig,
        env: &dyn EnvSource,
    ) -> Result<Principal, IdentityError> {
        let token_var = config_str(config, "token_env").unwrap_or(ENV_TOKEN);
        let token = required_var(env, token_var)?;
        if token.split('.').count() != 3 {
            return Err(IdentityError::Rejected {
                provider: self.name().to_string(),
                reason: format!("{} is not a JWT", token_var),
            });
        }

        let client_prefix = config_str(config, "client_id").map(|c| format!("{}:", c));
        let roles = parse_roles(env.var(ENV_ROLES))
            .into_iter()
            .filter_map(|role| match role.split_once(':') {
                // roles of other clients are not ours to grant
                Some(_) => client_prefix
                    .as_deref()
                    .and_then(|p| role.strip_prefix(p))
                    .map(String::from),
                None => Some(role),
            })
            .collect();

        Ok(Principal {
            name: required_var(env, ENV_PRINCIPAL)?,
            roles,
        })
    }
}
