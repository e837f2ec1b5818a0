// floe-core/src/domain/spec/validation.rs

// Flattens `validator` output into a list of dotted field paths so that a
// document reports every failing field at once.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::sync::OnceLock;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Sorted list of every field error in `errors`.
pub fn flatten_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out = Vec::new();
    collect("", errors, &mut out);
    out.sort();
    out
}

fn collect(prefix: &str, errors: &ValidationErrors, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let field = field.to_string();
        let path = if field == "__all__" {
            prefix.to_string()
        } else if prefix.is_empty() {
            field
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(list) => {
                for error in list {
                    out.push(FieldError::new(path.clone(), describe(error)));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect(&format!("{}[{}]", path, index), nested, out);
                }
            }
        }
    }
}

fn describe(error: &ValidationError) -> String {
    match &error.message {
        Some(message) => message.to_string(),
        None => format!("failed '{}' validation", error.code),
    }
}

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$")
            .unwrap_or_else(|_| Regex::new("$^").unwrap_or_else(|_| unreachable!()))
    })
}

pub fn is_identifier(value: &str) -> bool {
    identifier_re().is_match(value)
}

/// Model names end up as relation names, so they must be plain identifiers.
pub fn validate_identifier(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || is_identifier(value) {
        // Emptiness is reported by the `length` rule
        return Ok(());
    }
    let mut error = ValidationError::new("identifier");
    error.message = Some(Cow::Owned(format!(
        "'{}' must match [A-Za-z_][A-Za-z0-9_]*",
        value
    )));
    Err(error)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::spec::FloeSpec;
    use validator::Validate;

    #[test]
    fn test_every_failing_field_is_listed() {
        let yaml = r#"
apiVersion: floe.dev/v1
kind: FloeSpec
metadata:
  name: ""
transforms:
  - name: ok_model
  - name: "bad-name"
    columns:
      - name: ""
"#;
        let spec: FloeSpec = serde_yaml::from_str(yaml).unwrap();
        let errors = flatten_errors(&spec.validate().unwrap_err());
        let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "metadata.name",
                "metadata.version",
                "transforms[1].columns[0].name",
                "transforms[1].name",
            ]
        );
        assert!(errors[3].message.contains("bad-name"));
    }

    #[test]
    fn test_identifier_rule() {
        assert!(is_identifier("stg_customers"));
        assert!(is_identifier("_tmp1"));
        assert!(!is_identifier("1st"));
        assert!(!is_identifier("a.b"));
        assert!(validate_identifier("").is_ok());
    }
}
