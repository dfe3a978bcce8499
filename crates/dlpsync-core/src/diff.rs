// ── Structural diff ──
//
// Two entity bodies are equal when they match after canonicalization:
//   - `supported_confidence_levels` is dropped wherever it appears,
//   - arrays are compared as multisets (order ignored, repeats counted),
//   - integral floats compare equal to the matching integer.
//
// The resulting `Diff` exists for reporting only. Nothing replays it.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Number, Value};

/// Field ignored at any depth when comparing.
pub const EXCLUDED_FIELD: &str = "supported_confidence_levels";

/// One difference between a source and a destination body.
///
/// `path` uses dotted keys with `[]` for array members, e.g.
/// `detection_rules[].expression_tree.operator_type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum Change {
    /// Same location, different scalar (or differently-shaped) value.
    Changed {
        path: String,
        source: Value,
        destination: Value,
    },
    /// Present only on the source side; an update would add it.
    OnlyInSource { path: String, value: Value },
    /// Present only on the destination; an update would drop it.
    OnlyInDestination { path: String, value: Value },
}

impl Change {
    pub fn path(&self) -> &str {
        match self {
            Self::Changed { path, .. }
            | Self::OnlyInSource { path, .. }
            | Self::OnlyInDestination { path, .. } => path,
        }
    }
}

/// Every difference between two bodies, in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Diff {
    changes: Vec<Change>,
}

impl Diff {
    /// Compare `source` against `destination`.
    pub fn between(source: &Value, destination: &Value) -> Self {
        let mut changes = Vec::new();
        walk(
            &mut String::new(),
            &canonicalize(source),
            &canonicalize(destination),
            &mut changes,
        );
        Self { changes }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, change) in self.changes.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let path = match change.path() {
                "" => "<root>",
                p => p,
            };
            match change {
                Change::Changed {
                    source,
                    destination,
                    ..
                } => write!(f, "~ {path}: {destination} -> {source}")?,
                Change::OnlyInSource { value, .. } => write!(f, "+ {path}: {value}")?,
                Change::OnlyInDestination { value, .. } => write!(f, "- {path}: {value}")?,
            }
        }
        Ok(())
    }
}

// ── Canonical form ───────────────────────────────────────────────────

/// Canonical copy of `value`: excluded field removed at any depth,
/// integral floats turned into integers, array members sorted by their
/// stable serialization.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .filter(|(key, _)| key.as_str() != EXCLUDED_FIELD)
                .map(|(key, value)| (key.clone(), canonicalize(value)))
                .collect::<Map<_, _>>(),
        ),
        Value::Array(items) => {
            let mut keyed: Vec<(String, Value)> = items
                .iter()
                .map(|item| {
                    let canonical = canonicalize(item);
                    (stable_key(&canonical), canonical)
                })
                .collect();
            keyed.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Array(keyed.into_iter().map(|(_, v)| v).collect())
        }
        Value::Number(n) => Value::Number(canonical_number(n)),
        other => other.clone(),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::as_conversions, clippy::float_cmp)]
fn canonical_number(n: &Number) -> Number {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 9.0e15 => Number::from(f as i64),
        _ => n.clone(),
    }
}

/// Serialization with object keys sorted, independent of how the map
/// type orders its entries.
fn stable_key(value: &Value) -> String {
    let mut out = String::new();
    write_stable(value, &mut out);
    out
}

fn write_stable(value: &Value, out: &mut String) {
    match value {
        Value::Object(fields) => {
            let mut keys: Vec<&String> = fields.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                if let Some(v) = fields.get(key) {
                    write_stable(v, out);
                }
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_stable(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

// ── Tree walk ────────────────────────────────────────────────────────

fn walk(path: &mut String, source: &Value, destination: &Value, out: &mut Vec<Change>) {
    match (source, destination) {
        (Value::Object(src), Value::Object(dst)) => {
            for (key, sv) in src {
                let len = path.len();
                push_key(path, key);
                match dst.get(key) {
                    Some(dv) => walk(path, sv, dv, out),
                    None => out.push(Change::OnlyInSource {
                        path: path.clone(),
                        value: sv.clone(),
                    }),
                }
                path.truncate(len);
            }
            for (key, dv) in dst.iter().filter(|(key, _)| !src.contains_key(*key)) {
                let len = path.len();
                push_key(path, key);
                out.push(Change::OnlyInDestination {
                    path: path.clone(),
                    value: dv.clone(),
                });
                path.truncate(len);
            }
        }
        (Value::Array(src), Value::Array(dst)) => {
            let member = format!("{path}[]");

            // Unmatched destination members per stable key.
            let mut remaining: HashMap<String, usize> = HashMap::new();
            for item in dst {
                *remaining.entry(stable_key(item)).or_default() += 1;
            }
            for item in src {
                match remaining.get_mut(&stable_key(item)) {
                    Some(count) if *count > 0 => *count -= 1,
                    _ => out.push(Change::OnlyInSource {
                        path: member.clone(),
                        value: item.clone(),
                    }),
                }
            }
            for item in dst {
                if let Some(count) = remaining.get_mut(&stable_key(item)) {
                    if *count > 0 {
                        *count -= 1;
                        out.push(Change::OnlyInDestination {
                            path: member.clone(),
                            value: item.clone(),
                        });
                    }
                }
            }
        }
        (s, d) if s == d => {}
        (s, d) => out.push(Change::Changed {
            path: path.clone(),
            source: s.clone(),
            destination: d.clone(),
        }),
    }
}

fn push_key(path: &mut String, key: &str) {
    if !path.is_empty() {
        path.push('.');
    }
    path.push_str(key);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn identical_bodies_have_no_diff() {
        let a = json!({"name": "SSN", "regexes": [{"regex": "\\d+", "weight": 1}]});
        assert!(Diff::between(&a, &a.clone()).is_empty());
    }

    #[test]
    fn list_order_is_ignored() {
        let a = json!({"tags": ["a", "b", "c"], "rules": [{"x": 1}, {"y": 2}]});
        let b = json!({"tags": ["c", "a", "b"], "rules": [{"y": 2}, {"x": 1}]});
        assert!(Diff::between(&a, &b).is_empty());
    }

    #[test]
    fn repeats_are_counted() {
        let a = json!({"tags": ["a", "a", "b"]});
        let b = json!({"tags": ["a", "b", "b"]});

        let diff = Diff::between(&a, &b);

        assert_eq!(
            diff.changes(),
            &[
                Change::OnlyInSource {
                    path: "tags[]".into(),
                    value: json!("a")
                },
                Change::OnlyInDestination {
                    path: "tags[]".into(),
                    value: json!("b")
                },
            ]
        );
    }

    #[test]
    fn excluded_field_is_ignored_at_any_depth() {
        let a = json!({
            "name": "SSN",
            "supported_confidence_levels": ["high"],
            "rules": [{"supported_confidence_levels": ["low", "medium"], "x": 1}]
        });
        let b = json!({
            "name": "SSN",
            "supported_confidence_levels": ["low"],
            "rules": [{"x": 1}]
        });
        assert!(Diff::between(&a, &b).is_empty());
    }

    #[test]
    fn integral_float_equals_integer() {
        assert!(Diff::between(&json!({"n": 3.0}), &json!({"n": 3})).is_empty());
        assert!(!Diff::between(&json!({"n": 3.5}), &json!({"n": 3})).is_empty());
    }

    #[test]
    fn key_order_does_not_matter_inside_lists() {
        let a = json!([{"a": 1, "b": 2}]);
        let b = json!([{"b": 2, "a": 1}]);
        assert_eq!(canonicalize(&a), canonicalize(&b));
    }

    #[test]
    fn reports_changed_added_and_removed_fields() {
        let source = json!({"name": "SSN", "description": "new", "extra": true});
        let dest = json!({"name": "SSN", "description": "old", "legacy": 1});

        let diff = Diff::between(&source, &dest);

        assert_eq!(diff.len(), 3);
        assert_eq!(
            diff.changes()[0],
            Change::Changed {
                path: "description".into(),
                source: json!("new"),
                destination: json!("old"),
            }
        );
        assert!(diff.changes().contains(&Change::OnlyInSource {
            path: "extra".into(),
            value: json!(true)
        }));
        assert!(diff.changes().contains(&Change::OnlyInDestination {
            path: "legacy".into(),
            value: json!(1)
        }));
    }

    #[test]
    fn nested_paths_are_dotted() {
        let source = json!({"rule": {"tree": {"op": "and"}}});
        let dest = json!({"rule": {"tree": {"op": "or"}}});

        let diff = Diff::between(&source, &dest);

        assert_eq!(diff.changes()[0].path(), "rule.tree.op");
        assert_eq!(diff.to_string(), "~ rule.tree.op: \"or\" -> \"and\"");
    }

    #[test]
    fn serializes_as_change_list() {
        let diff = Diff::between(&json!({"a": 1}), &json!({"a": 2}));
        assert_eq!(
            serde_json::to_value(&diff).unwrap(),
            json!([{"change": "changed", "path": "a", "source": 1, "destination": 2}])
        );
    }
}
