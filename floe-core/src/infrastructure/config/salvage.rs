// floe-core/src/infrastructure/config/salvage.rs

// Deserializes a YAML document while collecting every type error: the failing
// node is recorded, pruned from the tree, and the rest is parsed again.

use crate::domain::spec::FieldError;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::debug;

const MAX_PRUNED: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// What survived deserialization, plus the type errors met on the way.
///
/// `value` is `None` when no pruning made the document parse.
pub(super) struct Salvaged<T> {
    pub value: Option<T>,
    pub type_errors: Vec<FieldError>,
    /// Original indices pruned from each sequence, keyed by its original path.
    removed: BTreeMap<String, Vec<usize>>,
}

impl<T> Salvaged<T> {
    fn parsed(value: T) -> Self {
        Self {
            value: Some(value),
            type_errors: Vec::new(),
            removed: BTreeMap::new(),
        }
    }

    /// Maps a path in the pruned tree back to the document's own indices.
    pub fn original_path(&self, pruned: &str) -> String {
        if self.removed.is_empty() {
            return pruned.to_string();
        }
        match parse_path(pruned) {
            Some(segments) => render(&self.to_original(&segments)),
            None => pruned.to_string(),
        }
    }

    /// True when `path` is, or sits under, a field already reported as a type error.
    pub fn shadowed(&self, path: &str) -> bool {
        self.type_errors.iter().any(|e| {
            path == e.path
                || path
                    .strip_prefix(e.path.as_str())
                    .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('['))
        })
    }

    fn to_original(&self, segments: &[Segment]) -> Vec<Segment> {
        let mut out = Vec::with_capacity(segments.len());
        for segment in segments {
            let mapped = match segment {
                Segment::Index(i) => {
                    let gone = self
                        .removed
                        .get(&render(&out))
                        .map(Vec::as_slice)
                        .unwrap_or_default();
                    Segment::Index(original_index(*i, gone))
                }
                key => key.clone(),
            };
            out.push(mapped);
        }
        out
    }

    fn prune(&mut self, tree: &mut Value, segments: &[Segment]) -> bool {
        let Some((last, parents)) = segments.split_last() else {
            return false;
        };
        let mut node = tree;
        for segment in parents {
            let next = match (segment, node) {
                (Segment::Key(key), Value::Mapping(map)) => map.get_mut(key.as_str()),
                (Segment::Index(i), Value::Sequence(seq)) => seq.get_mut(*i),
                _ => None,
            };
            let Some(next) = next else {
                return false;
            };
            node = next;
        }

        match (last, node) {
            (Segment::Key(key), Value::Mapping(map)) => map.shift_remove(key.as_str()).is_some(),
            (Segment::Index(i), Value::Sequence(seq)) if *i < seq.len() => {
                seq.remove(*i);
                let parent = render(&self.to_original(parents));
                let gone = self.removed.entry(parent).or_default();
                let original = original_index(*i, gone);
                let at = gone.partition_point(|&g| g < original);
                gone.insert(at, original);
                true
            }
            _ => false,
        }
    }
}

/// Parses `yaml` into `T`, pruning failing nodes until it fits.
///
/// Errors that carry no field path (broken YAML, a document of the wrong
/// shape) are returned as-is.
pub(super) fn deserialize_collecting<T: DeserializeOwned>(
    yaml: &str,
) -> Result<Salvaged<T>, serde_yaml::Error> {
    let first = match serde_yaml::from_str::<T>(yaml) {
        Ok(value) => return Ok(Salvaged::parsed(value)),
        Err(e) => e,
    };
    let mut failure = locate(&first);
    if failure.0.is_empty() && missing_field(&failure.1).is_none() {
        return Err(first);
    }

    let mut tree: Value = serde_yaml::from_str(yaml)?;
    let mut salvaged = Salvaged {
        value: None,
        type_errors: Vec::new(),
        removed: BTreeMap::new(),
    };

    for _ in 0..MAX_PRUNED {
        let (segments, message) = failure;
        let mut field = salvaged.to_original(&segments);
        if let Some(name) = missing_field(&message) {
            field.push(Segment::Key(name.to_string()));
        }
        let field = render(&field);
        if salvaged.type_errors.iter().any(|e| e.path == field) {
            break;
        }
        debug!(field = %field, error = %message, "Pruning field that failed to deserialize");
        salvaged.type_errors.push(FieldError::new(field, message));

        if !salvaged.prune(&mut tree, &segments) {
            break;
        }
        match serde_yaml::from_str::<T>(&serde_yaml::to_string(&tree)?) {
            Ok(value) => {
                salvaged.value = Some(value);
                break;
            }
            Err(e) => failure = locate(&e),
        }
    }
    Ok(salvaged)
}

/// Splits a serde_yaml message into the failing path and the bare message.
fn locate(error: &serde_yaml::Error) -> (Vec<Segment>, String) {
    let text = error.to_string();
    let text = location_re().replace(&text, "").into_owned();
    let located = prefix_re()
        .captures(&text)
        .and_then(|caps| Some((parse_path(&caps[1])?, caps[2].to_string())));
    located.unwrap_or((Vec::new(), text))
}

fn missing_field(message: &str) -> Option<&str> {
    missing_re()
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn parse_path(path: &str) -> Option<Vec<Segment>> {
    let mut segments = Vec::new();
    for part in path.split('.') {
        let (key, mut rest) = match part.find('[') {
            Some(at) => part.split_at(at),
            None => (part, ""),
        };
        if key.is_empty() && (segments.is_empty() || rest.is_empty()) {
            return None;
        }
        if !key.is_empty() {
            segments.push(Segment::Key(key.to_string()));
        }
        while let Some(open) = rest.strip_prefix('[') {
            let close = open.find(']')?;
            segments.push(Segment::Index(open[..close].parse().ok()?));
            rest = &open[close + 1..];
        }
        if !rest.is_empty() {
            return None;
        }
    }
    Some(segments)
}

fn render(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Key(key) if out.is_empty() => out.push_str(key),
            Segment::Key(key) => {
                out.push('.');
                out.push_str(key);
            }
            Segment::Index(i) => out.push_str(&format!("[{}]", i)),
        }
    }
    out
}

/// `removed` holds ascending original indices.
fn original_index(pruned: usize, removed: &[usize]) -> usize {
    let mut index = pruned;
    for &gone in removed {
        if gone <= index {
            index += 1;
        } else {
            break;
        }
    }
    index
}

fn prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)^([^\s:]+): (.*)$")
            .unwrap_or_else(|_| Regex::new("$^").unwrap_or_else(|_| unreachable!()))
    })
}

fn location_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r" at line \d+ column \d+$")
            .unwrap_or_else(|_| Regex::new("$^").unwrap_or_else(|_| unreachable!()))
    })
}

fn missing_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^missing field `([^`]+)`$")
            .unwrap_or_else(|_| Regex::new("$^").unwrap_or_else(|_| unreachable!()))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Tank {
        #[serde(default)]
        level: u32,
        #[serde(default)]
        valves: Vec<Valve>,
    }

    #[derive(Debug, Deserialize)]
    struct Valve {
        id: String,
        #[serde(default)]
        open: bool,
    }

    #[test]
    fn test_paths_round_trip() {
        let segments = parse_path("transforms[1].columns[0].name").unwrap();
        assert_eq!(segments.len(), 5);
        assert_eq!(render(&segments), "transforms[1].columns[0].name");
        assert!(parse_path("a[x]").is_none());
        assert!(parse_path("[0]").is_none());
        assert!(parse_path("").is_none());
    }

    #[test]
    fn test_original_index_skips_pruned_entries() {
        assert_eq!(original_index(0, &[]), 0);
        assert_eq!(original_index(1, &[1]), 2);
        assert_eq!(original_index(1, &[1, 2]), 3);
        assert_eq!(original_index(0, &[1]), 0);
    }

    #[test]
    fn test_pruned_sequence_entries_keep_their_indices() -> Result<()> {
        let yaml = r#"
level: high
valves:
  - just-a-string
  - id: v2
    open: sometimes
  - id: v3
  - open: true
"#;
        let salvaged = deserialize_collecting::<Tank>(yaml)?;
        let paths: Vec<&str> = salvaged.type_errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["level", "valves[0]", "valves[1].open", "valves[3].id"]
        );
        let tank = salvaged.value.as_ref().unwrap();
        assert_eq!(tank.level, 0);
        assert_eq!(tank.valves.len(), 2);
        assert_eq!(salvaged.original_path("valves[1].id"), "valves[2].id");
        Ok(())
    }

    #[test]
    fn test_shape_errors_are_returned_untouched() {
        assert!(deserialize_collecting::<Tank>("- not\n- a mapping\n").is_err());
        assert!(deserialize_collecting::<Tank>("valves: [unclosed").is_err());
    }
}
