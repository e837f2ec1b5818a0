// floe-core/src/domain/identity.rs

use crate::domain::governance::RbacConfig;
use crate::domain::plugin::{IdentityPlugin, PluginConfig};
use crate::ports::EnvSource;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

impl Principal {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum IdentityError {
    #[error("RBAC is enabled but no credentials were found (missing {missing})")]
    #[diagnostic(
        code(floe::identity::missing_credentials),
        help("Export FLOE_TOKEN and FLOE_PRINCIPAL, or disable governance.rbac in the manifest.")
    )]
    MissingCredentials { missing: String },

    #[error("Principal '{principal}' lacks required role '{role}'")]
    #[diagnostic(code(floe::identity::missing_role))]
    MissingRole { principal: String, role: String },

    #[error("Identity provider '{provider}' rejected the credentials: {reason}")]
    #[diagnostic(code(floe::identity::rejected))]
    Rejected { provider: String, reason: String },
}

/// RBAC gate run before enforcement. Returns `None` when RBAC is disabled:
/// missing credentials are only fatal when the manifest turns RBAC on.
pub fn authorize(
    rbac: &RbacConfig,
    provider: &dyn IdentityPlugin,
    config: &PluginConfig,
    env: &dyn EnvSource,
) -> Result<Option<Principal>, IdentityError> {
    if !rbac.is_enabled() {
        debug!("RBAC disabled, skipping identity check");
        return Ok(None);
    }

    let principal = provider.authenticate(config, env)?;
    if let Some(role) = &rbac.required_role
        && !principal.has_role(role)
    {
        return Err(IdentityError::MissingRole {
            principal: principal.name,
            role: role.clone(),
        });
    }

    info!(principal = %principal.name, provider = provider.name(), "Identity verified");
    Ok(Some(principal))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::plugin::{CapabilityKind, FloePlugin};
    use std::collections::BTreeMap;

    struct TokenIdentity;

    impl FloePlugin for TokenIdentity {
        fn name(&self) -> &str {
            "token"
        }
        fn version(&self) -> &str {
            "0.1.0"
        }
        fn capability(&self) -> CapabilityKind {
            CapabilityKind::Identity
        }
    }

    impl IdentityPlugin for TokenIdentity {
        fn authenticate(
            &self,
            _config: &PluginConfig,
            env: &dyn EnvSource,
        ) -> Result<Principal, IdentityError> {
            env.var("FLOE_TOKEN")
                .ok_or_else(|| IdentityError::MissingCredentials {
                    missing: "FLOE_TOKEN".into(),
                })?;
            Ok(Principal {
                name: env.var("FLOE_PRINCIPAL").unwrap_or_default(),
                roles: vec!["data_engineer".into()],
            })
        }
    }

    fn rbac(enabled: bool, role: Option<&str>) -> RbacConfig {
        RbacConfig {
            enabled: Some(enabled),
            required_role: role.map(String::from),
        }
    }

    #[test]
    fn test_disabled_rbac_ignores_missing_credentials() {
        let env: BTreeMap<String, String> = BTreeMap::new();
        let result = authorize(&rbac(false, None), &TokenIdentity, &PluginConfig::new(), &env);
        assert_eq!(result.unwrap(), None);
    }

    #[test]
    fn test_enabled_rbac_requires_credentials() {
        let env: BTreeMap<String, String> = BTreeMap::new();
        let err =
            authorize(&rbac(true, None), &TokenIdentity, &PluginConfig::new(), &env).unwrap_err();
        assert!(matches!(err, IdentityError::MissingCredentials { .. }));
    }

    #[test]
    fn test_required_role_is_checked() {
        let env = BTreeMap::from([
            ("FLOE_TOKEN".to_string(), "t0k3n".to_string()),
            ("FLOE_PRINCIPAL".to_string(), "alice".to_string()),
        ]);
        let ok = authorize(
            &rbac(true, Some("data_engineer")),
            &TokenIdentity,
            &PluginConfig::new(),
            &env,
        )
        .unwrap()
        .unwrap();
        assert_eq!(ok.name, "alice");

        let err = authorize(
            &rbac(true, Some("platform_admin")),
            &TokenIdentity,
            &PluginConfig::new(),
            &env,
        )
        .unwrap_err();
        assert_eq!(
            err,
            IdentityError::MissingRole {
                principal: "alice".into(),
                role: "platform_admin".into()
            }
        );
    }
}
