// floe-core/src/domain/governance/validators/documentation.rs

use super::PolicyValidator;
use crate::domain::governance::config::DocumentationConfig;
use crate::domain::governance::error::EnforcementError;
use crate::domain::governance::violation::{PolicyType, Violation, ViolationSeverity, codes};
use crate::domain::graph::ModelGraph;
use crate::domain::resolution::ResolvedModel;

pub struct DocumentationValidator {
    config: Option<DocumentationConfig>,
    placeholders: Vec<String>,
}

impl DocumentationValidator {
    pub fn new(config: Option<&DocumentationConfig>) -> Self {
        let placeholders = config
            .map(|c| {
                c.placeholders()
                    .into_iter()
                    .map(|p| p.trim().to_ascii_lowercase())
                    .filter(|p| !p.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Self {
            config: config.cloned(),
            placeholders,
        }
    }

    /// `TODO`, `tbd.` or `TODO: describe` all count as placeholders.
    fn is_placeholder(&self, description: &str) -> bool {
        let text = description.trim().to_ascii_lowercase();
        self.placeholders.iter().any(|p| {
            text == *p
                || text
                    .strip_prefix(p.as_str())
                    .and_then(|rest| rest.chars().next())
                    .is_some_and(|c| !c.is_ascii_alphanumeric())
        })
    }

    fn non_blank(description: Option<&str>) -> Option<&str> {
        description.filter(|d| !d.trim().is_empty())
    }

    fn check_model(&self, config: &DocumentationConfig, model: &ResolvedModel) -> Vec<Violation> {
        let mut out = Vec::new();

        match Self::non_blank(model.description.as_deref()) {
            None if config.require_model_descriptions() => out.push(
                Violation::new(
                    codes::MODEL_DESCRIPTION_MISSING,
                    ViolationSeverity::Error,
                    PolicyType::Documentation,
                    &model.name,
                    format!("Model '{}' has no description", model.name),
                )
                .with_expected("a non-empty description")
                .with_actual("missing")
                .with_suggestion("Add a `description:` to the transform")
                .with_location(model.path.as_deref()),
            ),
            Some(text) if self.is_placeholder(text) => {
                out.push(self.placeholder(model, None, text));
            }
            _ => {}
        }

        for column in &model.columns {
            match Self::non_blank(column.description.as_deref()) {
                None if config.require_column_descriptions() => out.push(
                    Violation::new(
                        codes::COLUMN_DESCRIPTION_MISSING,
                        ViolationSeverity::Error,
                        PolicyType::Documentation,
                        &model.name,
                        format!(
                            "Column '{}.{}' has no description",
                            model.name, column.name
                        ),
                    )
                    .with_column(&column.name)
                    .with_expected("a non-empty description")
                    .with_actual("missing")
                    .with_location(model.path.as_deref()),
                ),
                Some(text) if self.is_placeholder(text) => {
                    out.push(self.placeholder(model, Some(&column.name), text));
                }
                _ => {}
            }
        }

        out
    }

    fn placeholder(&self, model: &ResolvedModel, column: Option<&str>, text: &str) -> Violation {
        let subject = match column {
            Some(c) => format!("Column '{}.{}'", model.name, c),
            None => format!("Model '{}'", model.name),
        };
        let v = Violation::new(
            codes::PLACEHOLDER_DESCRIPTION,
            ViolationSeverity::Warning,
            PolicyType::Documentation,
            &model.name,
            format!("{} has a placeholder description", subject),
        )
        .with_expected("a meaningful description")
        .with_actual(text)
        .with_location(model.path.as_deref());
        match column {
            Some(c) => v.with_column(c),
            None => v,
        }
    }
}

impl PolicyValidator for DocumentationValidator {
    fn name(&self) -> &'static str {
        "documentation"
    }

    fn policy_type(&self) -> PolicyType {
        PolicyType::Documentation
    }

    fn validate(&self, graph: &ModelGraph) -> Result<Vec<Violation>, EnforcementError> {
        let Some(config) = &self.config else {
            return Ok(Vec::new());
        };
        Ok(graph
            .models()
            .flat_map(|m| self.check_model(config, m))
            .collect())
    }
}
