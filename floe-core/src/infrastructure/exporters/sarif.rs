// floe-core/src/infrastructure/exporters/sarif.rs

// SARIF 2.1.0, one run per report. The rule catalog is keyed by error code;
// each violation becomes one result whose properties bag carries the floe
// specific fields.
//
// Not carried over (lost by parse_sarif): downstream_impact,
// override_applied and column_name.

use crate::domain::compiler::FLOE_VERSION;
use crate::domain::governance::{
    DOCS_BASE_URL, EnforcementLevel, EnforcementResult, PolicyType, Violation,
    ViolationLocation, ViolationSeverity, codes,
};
use crate::infrastructure::error::InfrastructureError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SARIF_VERSION: &str = "2.1.0";
pub const SARIF_SCHEMA: &str = "https://json.schemastore.org/sarif-2.1.0.json";

// --- WIRE TYPES ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SarifLog {
    #[serde(rename = "$schema")]
    pub schema: String,
    pub version: String,
    pub runs: Vec<SarifRun>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRun {
    pub tool: SarifTool,
    pub results: Vec<SarifResult>,
    #[serde(default)]
    pub properties: RunProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SarifTool {
    pub driver: SarifDriver,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifDriver {
    pub name: String,
    pub version: String,
    pub information_uri: String,
    #[serde(default)]
    pub rules: Vec<SarifRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRule {
    pub id: String,
    pub short_description: SarifMessage,
    pub help_uri: String,
    pub default_configuration: RuleConfiguration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfiguration {
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SarifMessage {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifResult {
    pub rule_id: String,
    pub level: String,
    pub message: SarifMessage,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<SarifLocation>,
    pub properties: ResultProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifLocation {
    pub physical_location: PhysicalLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalLocation {
    pub artifact_location: ArtifactLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactLocation {
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub start_line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultProperties {
    pub policy_type: PolicyType,
    pub model_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunProperties {
    #[serde(default)]
    pub enforcement_level: EnforcementLevel,
    #[serde(default)]
    pub models_validated: usize,
    #[serde(default)]
    pub duration_ms: u64,
}

// --- MAPPING ---

fn level(severity: ViolationSeverity) -> &'static str {
    match severity {
        ViolationSeverity::Error => "error",
        ViolationSeverity::Warning => "warning",
        ViolationSeverity::Info => "note",
    }
}

fn severity(level: &str) -> Result<ViolationSeverity, InfrastructureError> {
    match level {
        "error" => Ok(ViolationSeverity::Error),
        "warning" => Ok(ViolationSeverity::Warning),
        "note" | "none" => Ok(ViolationSeverity::Info),
        other => Err(InfrastructureError::InvalidReport(format!(
            "unknown SARIF level '{}'",
            other
        ))),
    }
}

fn rules(violations: &[Violation]) -> Vec<SarifRule> {
    // Strictest severity seen per code, catalog sorted by code
    let mut catalog: BTreeMap<&str, ViolationSeverity> = BTreeMap::new();
    for v in violations {
        catalog
            .entry(v.error_code.as_str())
            .and_modify(|s| *s = (*s).min(v.severity))
            .or_insert(v.severity);
    }
    catalog
        .into_iter()
        .map(|(code, sev)| SarifRule {
            id: code.to_string(),
            short_description: SarifMessage {
                text: codes::title(code).to_string(),
            },
            help_uri: format!("{}/{}", DOCS_BASE_URL, code.to_ascii_lowercase()),
            default_configuration: RuleConfiguration {
                level: level(sev).to_string(),
            },
        })
        .collect()
}

fn to_result(v: &Violation) -> SarifResult {
    let locations = v
        .location
        .as_ref()
        .map(|loc| SarifLocation {
            physical_location: PhysicalLocation {
                artifact_location: ArtifactLocation {
                    uri: loc.file.clone(),
                },
                region: loc.line.map(|start_line| Region { start_line }),
            },
        })
        .into_iter()
        .collect();
    SarifResult {
        rule_id: v.error_code.clone(),
        level: level(v.severity).to_string(),
        message: SarifMessage {
            text: v.message.clone(),
        },
        locations,
        properties: ResultProperties {
            policy_type: v.policy_type,
            model_name: v.model_name.clone(),
            expected: v.expected.clone(),
            actual: v.actual.clone(),
            suggestion: v.suggestion.clone(),
        },
    }
}

fn from_result(r: &SarifResult) -> Result<Violation, InfrastructureError> {
    let mut v = Violation::new(
        &r.rule_id,
        severity(&r.level)?,
        r.properties.policy_type,
        r.properties.model_name.clone(),
        r.message.text.clone(),
    );
    v.expected = r.properties.expected.clone();
    v.actual = r.properties.actual.clone();
    v.suggestion = r.properties.suggestion.clone();
    v.location = r.locations.first().map(|loc| ViolationLocation {
        file: loc.physical_location.artifact_location.uri.clone(),
        line: loc.physical_location.region.as_ref().map(|r| r.start_line),
    });
    Ok(v)
}

// --- PUBLIC API ---

pub fn to_sarif(result: &EnforcementResult) -> SarifLog {
    SarifLog {
        schema: SARIF_SCHEMA.to_string(),
        version: SARIF_VERSION.to_string(),
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: "floe".to_string(),
                    version: FLOE_VERSION.to_string(),
                    information_uri: DOCS_BASE_URL.to_string(),
                    rules: rules(result.violations()),
                },
            },
            results: result.violations().iter().map(to_result).collect(),
            properties: RunProperties {
                enforcement_level: result.enforcement_level(),
                models_validated: result.models_validated(),
                duration_ms: result.duration_ms(),
            },
        }],
    }
}

pub fn render_sarif(result: &EnforcementResult) -> Result<String, InfrastructureError> {
    let mut out = serde_json::to_string_pretty(&to_sarif(result))?;
    out.push('\n');
    Ok(out)
}

/// Reads a report produced by `render_sarif` back into a result.
pub fn parse_sarif(raw: &str) -> Result<EnforcementResult, InfrastructureError> {
    let log: SarifLog = serde_json::from_str(raw)?;
    if log.version != SARIF_VERSION {
        return Err(InfrastructureError::InvalidReport(format!(
            "unsupported SARIF version '{}'",
            log.version
        )));
    }
    let [run] = log.runs.as_slice() else {
        return Err(InfrastructureError::InvalidReport(format!(
            "expected exactly one run, found {}",
            log.runs.len()
        )));
    };
    let violations = run
        .results
        .iter()
        .map(from_result)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(EnforcementResult::new(
        violations,
        run.properties.enforcement_level,
        run.properties.models_validated,
        run.properties.duration_ms,
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn sample() -> EnforcementResult {
        let mut naming = Violation::new(
            codes::NAMING_CONVENTION,
            ViolationSeverity::Error,
            PolicyType::Naming,
            "customers",
            "Model 'customers' does not match the medallion convention",
        )
        .with_expected("bronze_*, silver_*, gold_*")
        .with_actual("customers")
        .with_suggestion("Rename to silver_customers")
        .with_location(Some("models/customers.sql"));
        naming.location.as_mut().unwrap().line = Some(3);

        let docs = Violation::new(
            codes::COLUMN_DESCRIPTION_MISSING,
            ViolationSeverity::Warning,
            PolicyType::Documentation,
            "silver_orders",
            "Column 'id' has no description",
        )
        .with_column("id");
        let tags = Violation::new(
            codes::REQUIRED_TAGS,
            ViolationSeverity::Info,
            PolicyType::Custom,
            "silver_orders",
            "missing tag",
        );
        EnforcementResult::new(vec![naming, docs, tags], EnforcementLevel::Strict, 2, 17)
    }

    #[test]
    fn test_sarif_shape() {
        let log = to_sarif(&sample());
        let run = &log.runs[0];
        let ids: Vec<&str> = run.tool.driver.rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["FLOE-E201", "FLOE-E221", "FLOE-E400"]);
        assert_eq!(run.results.len(), 3);
        assert_eq!(run.results[2].level, "note");
        assert!(run.results[1].locations.is_empty());

        let raw = serde_json::to_value(&log).unwrap();
        assert_eq!(raw["$schema"], SARIF_SCHEMA);
        assert_eq!(
            raw["runs"][0]["results"][0]["locations"][0]["physicalLocation"]["region"]["startLine"],
            3
        );
        assert_eq!(raw["runs"][0]["results"][0]["properties"]["policyType"], "naming");
    }

    #[test]
    fn test_round_trip_drops_only_documented_fields() -> Result<()> {
        let original = sample();
        let parsed = parse_sarif(&render_sarif(&original)?)?;

        // column_name is the only lossy field present in the sample
        let expected: Vec<Violation> = original
            .violations()
            .iter()
            .cloned()
            .map(|mut v| {
                v.column_name = None;
                v
            })
            .collect();
        assert_eq!(parsed.violations(), expected.as_slice());
        assert_eq!(parsed.summary(), original.summary());
        assert_eq!(parsed.duration_ms(), 17);
        Ok(())
    }

    #[test]
    fn test_foreign_documents_are_rejected() {
        let raw = r#"{"$schema": "x", "version": "2.0.0", "runs": []}"#;
        assert!(matches!(
            parse_sarif(raw),
            Err(InfrastructureError::InvalidReport(_))
        ));
        assert!(parse_sarif("not json").is_err());
    }
}
