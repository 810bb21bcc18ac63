//! Cross-step data references.
//!
//! A string argument may embed `{{RESULT_<n>.<path>}}` (or the bare form
//! `RESULT_<n>.<path>`), which is replaced by the value found at `<path>` inside
//! the output of step `<n>`. Paths are `.`-separated keys with optional `[i]`
//! indices: `files[0].path`, `[2]`, `items[1][0]`.
//!
//! Resolution never fails. A token whose step index, path or value cannot be
//! resolved (or resolves to `null`) is left in the string verbatim.

use crate::plan::StepResult;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use tracing::debug;

static REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{RESULT_(\d+)([\w\[\].]*)\}\}|\bRESULT_(\d+)((?:\.\w+|\[\d+\])*)")
        .expect("reference pattern is a valid regex")
});

/// Return a copy of `args` with every reference token substituted.
pub fn resolve_references(args: &Map<String, Value>, results: &[StepResult]) -> Map<String, Value> {
    args.iter()
        .map(|(k, v)| (k.clone(), resolve_value(v, results)))
        .collect()
}

/// Resolve references anywhere inside a JSON value.
pub fn resolve_value(value: &Value, results: &[StepResult]) -> Value {
    match value {
        Value::String(s) => Value::String(resolve_str(s, results)),
        Value::Array(items) => Value::Array(items.iter().map(|v| resolve_value(v, results)).collect()),
        Value::Object(map) => Value::Object(resolve_references(map, results)),
        other => other.clone(),
    }
}

fn resolve_str(input: &str, results: &[StepResult]) -> String {
    if !input.contains("RESULT_") {
        return input.to_string();
    }
    REFERENCE
        .replace_all(input, |caps: &Captures| {
            let (index, path) = match (caps.get(1), caps.get(3)) {
                (Some(index), _) => (index.as_str(), caps.get(2).map_or("", |m| m.as_str())),
                (None, Some(index)) => (index.as_str(), caps.get(4).map_or("", |m| m.as_str())),
                _ => return caps[0].to_string(),
            };
            match lookup(results, index, path) {
                Some(resolved) => resolved,
                None => {
                    debug!("[resolver] leaving unresolved reference '{}'", &caps[0]);
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

fn lookup(results: &[StepResult], index: &str, path: &str) -> Option<String> {
    let index: usize = index.parse().ok()?;
    let root = &results.get(index)?.output;
    match walk(root, path)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn walk<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        let (key, mut indices) = match segment.find('[') {
            Some(at) => segment.split_at(at),
            None => (segment, ""),
        };

        if !key.is_empty() {
            current = match current {
                Value::Object(map) => map.get(key)?,
                Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }

        while !indices.is_empty() {
            let inner = indices.strip_prefix('[')?;
            let close = inner.find(']')?;
            let i: usize = inner[..close].parse().ok()?;
            current = current.as_array()?.get(i)?;
            indices = &inner[close + 1..];
        }
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(output: Value) -> StepResult {
        StepResult::success("test", Map::new(), output)
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_braced_reference_with_indexed_path() {
        let results = vec![result(json!({"files": [{"path": "C:/notes.txt"}]}))];
        let resolved = resolve_references(
            &args(json!({"target": "{{RESULT_0.files[0].path}}"})),
            &results,
        );
        assert_eq!(resolved["target"], "C:/notes.txt");
    }

    #[test]
    fn test_bare_reference_and_embedded_text() {
        let results = vec![result(json!({"window": "Settings"})), result(json!("Bluetooth"))];
        let resolved = resolve_references(
            &args(json!({"goal": "open RESULT_1 in RESULT_0.window now"})),
            &results,
        );
        assert_eq!(resolved["goal"], "open Bluetooth in Settings now");
    }

    #[test]
    fn test_non_string_values_are_inserted_as_json() {
        let results = vec![result(json!({"count": 3, "range": {"min": 0, "max": 100}}))];
        let resolved = resolve_references(
            &args(json!({"a": "{{RESULT_0.count}}", "b": "{{RESULT_0.range}}"})),
            &results,
        );
        assert_eq!(resolved["a"], "3");
        assert_eq!(resolved["b"], r#"{"max":100,"min":0}"#);
    }

    #[test]
    fn test_unresolvable_references_pass_through() {
        let results = vec![result(json!({"files": [], "empty": null}))];
        let input = args(json!({
            "out_of_range": "{{RESULT_5.path}}",
            "bad_key": "{{RESULT_0.missing}}",
            "bad_index": "{{RESULT_0.files[3]}}",
            "null_value": "{{RESULT_0.empty}}",
            "index_into_object": "{{RESULT_0[0]}}"
        }));
        let resolved = resolve_references(&input, &results);
        assert_eq!(resolved, input);
    }

    #[test]
    fn test_recurses_into_nested_containers() {
        let results = vec![result(json!({"name": "Bluetooth"}))];
        let resolved = resolve_references(
            &args(json!({
                "action": {"type": "checkbox", "name": "{{RESULT_0.name}}"},
                "window_search_terms": ["Settings", "{{RESULT_0.name}}"],
                "max_attempts": 2
            })),
            &results,
        );
        assert_eq!(resolved["action"]["name"], "Bluetooth");
        assert_eq!(resolved["window_search_terms"], json!(["Settings", "Bluetooth"]));
        assert_eq!(resolved["max_attempts"], 2);
    }

    #[test]
    fn test_chained_indices() {
        let results = vec![result(json!({"grid": [[1, 2], [3, 4]]}))];
        let resolved = resolve_references(&args(json!({"v": "RESULT_0.grid[1][0]"})), &results);
        assert_eq!(resolved["v"], "3");
    }
}
