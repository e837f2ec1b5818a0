// floe-core/src/domain/plugin/version.rs

use std::fmt;

/// Plugin API version the host implements. Plugins must declare the same
/// MAJOR and a MINOR at least this high.
pub const FLOE_PLUGIN_API_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
}

impl ApiVersion {
    /// Accepts `MAJOR`, `MAJOR.MINOR` or `MAJOR.MINOR.PATCH` (patch is ignored).
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut parts = raw.trim().split('.');
        let major = parts
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| format!("Empty API version '{}'", raw))?
            .parse::<u32>()
            .map_err(|e| format!("Invalid major in API version '{}': {}", raw, e))?;
        let minor = match parts.next() {
            Some(p) => p
                .parse::<u32>()
                .map_err(|e| format!("Invalid minor in API version '{}': {}", raw, e))?,
            None => 0,
        };
        if let Some(patch) = parts.next() {
            patch
                .parse::<u32>()
                .map_err(|e| format!("Invalid patch in API version '{}': {}", raw, e))?;
        }
        if parts.next().is_some() {
            return Err(format!("Too many components in API version '{}'", raw));
        }
        Ok(Self { major, minor })
    }

    /// `self` is the version a plugin declares, `required` the host's.
    pub fn is_compatible_with(&self, required: &ApiVersion) -> bool {
        self.major == required.major && self.minor >= required.minor
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
