// floe-core/src/domain/governance/validators/semantic.rs

use super::PolicyValidator;
use crate::domain::governance::error::EnforcementError;
use crate::domain::governance::violation::{PolicyType, Violation, ViolationSeverity, codes};
use crate::domain::graph::ModelGraph;

/// Graph integrity: undefined refs, undefined sources, cycles. Always on.
#[derive(Default)]
pub struct SemanticValidator;

impl SemanticValidator {
    pub fn new() -> Self {
        Self
    }
}

impl PolicyValidator for SemanticValidator {
    fn name(&self) -> &'static str {
        "semantic"
    }

    fn policy_type(&self) -> PolicyType {
        PolicyType::Semantic
    }

    fn validate(&self, graph: &ModelGraph) -> Result<Vec<Violation>, EnforcementError> {
        let mut out = Vec::new();

        for (model, missing) in graph.undefined_refs() {
            out.push(
                Violation::new(
                    codes::UNDEFINED_REFERENCE,
                    ViolationSeverity::Error,
                    PolicyType::Semantic,
                    model,
                    format!("Model '{}' references undefined model '{}'", model, missing),
                )
                .with_expected(format!("a transform named '{}'", missing))
                .with_actual("not defined")
                .with_suggestion(format!(
                    "Add '{}' to transforms or remove the reference",
                    missing
                ))
                .with_location(location(graph, model)),
            );
        }

        for (model, source) in graph.undefined_sources() {
            out.push(
                Violation::new(
                    codes::UNDEFINED_SOURCE,
                    ViolationSeverity::Error,
                    PolicyType::Semantic,
                    model,
                    format!("Model '{}' reads undeclared source '{}'", model, source),
                )
                .with_expected(format!("'{}' declared under sources", source))
                .with_actual("not declared")
                .with_suggestion("Declare the table under `sources:` in floe.yaml")
                .with_location(location(graph, model)),
            );
        }

        for cycle in graph.find_cycles() {
            let Some(head) = cycle.first() else {
                continue;
            };
            let path = cycle.join(" -> ");
            out.push(
                Violation::new(
                    codes::CIRCULAR_DEPENDENCY,
                    ViolationSeverity::Error,
                    PolicyType::Semantic,
                    head.as_str(),
                    format!("Circular dependency: {}", path),
                )
                .with_expected("an acyclic dependency graph")
                .with_actual(path)
                .with_suggestion("Break the cycle by removing one depends_on or ref() edge")
                .with_location(location(graph, head)),
            );
        }

        Ok(out)
    }
}

fn location<'g>(graph: &'g ModelGraph, model: &str) -> Option<&'g str> {
    graph.get(model).and_then(|m| m.path.as_deref())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::resolution::ResolvedModel;
    use std::collections::BTreeSet;

    #[test]
    fn test_two_model_cycle_is_one_violation_with_full_path() {
        let g = ModelGraph::new(
            vec![
                ResolvedModel::new("A", "duckdb").depending_on(&["B"]),
                ResolvedModel::new("B", "duckdb").depending_on(&["A"]),
            ],
            BTreeSet::new(),
        );
        let out = SemanticValidator::new().validate(&g).unwrap();
        assert_eq!(out.len(), 1);
        let v = &out[0];
        assert_eq!(v.error_code, codes::CIRCULAR_DEPENDENCY);
        assert_eq!(v.actual.as_deref(), Some("A -> B -> A"));
        assert!(v.message.contains("A -> B -> A"));
    }

    #[test]
    fn test_undefined_ref_and_source() {
        let mut m = ResolvedModel::new("stg_orders", "duckdb").depending_on(&["ghost"]);
        m.sources = vec!["raw.orders".into()];
        m.path = Some("models/stg_orders.sql".into());
        let g = ModelGraph::new(vec![m], BTreeSet::new());
        let out = SemanticValidator::new().validate(&g).unwrap();
        let found: Vec<&str> = out.iter().map(|v| v.error_code.as_str()).collect();
        assert_eq!(found, vec![codes::UNDEFINED_REFERENCE, codes::UNDEFINED_SOURCE]);
        assert_eq!(
            out[0].location.as_ref().map(|l| l.file.as_str()),
            Some("models/stg_orders.sql")
        );
    }

    #[test]
    fn test_clean_graph_has_no_violations() {
        let g = ModelGraph::new(
            vec![
                ResolvedModel::new("a", "duckdb"),
                ResolvedModel::new("b", "duckdb").depending_on(&["a"]),
            ],
            BTreeSet::new(),
        );
        assert!(SemanticValidator::new().validate(&g).unwrap().is_empty());
    }
}
