// floe-core/src/infrastructure/exporters/json.rs

use crate::domain::governance::EnforcementResult;
use crate::infrastructure::error::InfrastructureError;

/// The full result (violations, summary, state), pretty printed.
pub fn render_json(result: &EnforcementResult) -> Result<String, InfrastructureError> {
    let mut out = serde_json::to_string_pretty(result)?;
    out.push('\n');
    Ok(out)
}

pub fn parse_json(raw: &str) -> Result<EnforcementResult, InfrastructureError> {
    Ok(serde_json::from_str(raw)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::governance::{
        EnforcementLevel, PolicyType, Violation, ViolationSeverity, codes,
    };
    use anyhow::Result;

    #[test]
    fn test_json_report_is_lossless() -> Result<()> {
        let mut v = Violation::new(
            codes::NAMING_CONVENTION,
            ViolationSeverity::Error,
            PolicyType::Naming,
            "customers",
            "bad name",
        )
        .with_column("id");
        v.downstream_impact = Some(vec!["fct_orders".into()]);
        let result = EnforcementResult::new(vec![v], EnforcementLevel::Strict, 3, 12);

        let raw = render_json(&result)?;
        assert!(raw.contains("\"state\": \"failed\""));
        assert_eq!(parse_json(&raw)?, result);
        Ok(())
    }
}
