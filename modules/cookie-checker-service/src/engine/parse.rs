//! Response parsing: extracts named values from a response body.
//!
//! Three modes share one contract: whatever is extracted lands in the capture
//! map, and an extraction miss leaves the name unbound rather than failing
//! the check.

use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

/// Marker bound when a json path cannot be resolved. The EXISTS comparer
/// treats it as "missing".
pub const NIL: &str = "<nil>";

/// Resolve each dotted path against the response parsed as JSON.
///
/// Paths may carry a leading `$.`. Every intermediate node must be an object
/// keyed by the next segment; any miss binds the literal `<nil>`. Array
/// indexing and wildcards are not supported.
pub fn parse_json_captures(
    response: &str,
    spec: &HashMap<String, String>,
) -> HashMap<String, String> {
    let data: Value = serde_json::from_str(response).unwrap_or(Value::Null);

    spec.iter()
        .map(|(name, path)| (name.clone(), resolve_json_path(&data, path)))
        .collect()
}

fn resolve_json_path(data: &Value, path: &str) -> String {
    let path = path.strip_prefix("$.").unwrap_or(path);

    let mut current = data;
    for segment in path.split('.') {
        match current {
            Value::Object(map) => match map.get(segment) {
                Some(next) => current = next,
                None => return NIL.to_string(),
            },
            _ => return NIL.to_string(),
        }
    }
    json_value_string(current)
}

/// Deterministic textual form: strings unquoted, scalars as serde_json
/// prints them, objects and arrays as compact JSON, null as `<nil>`.
fn json_value_string(value: &Value) -> String {
    match value {
        Value::Null => NIL.to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Match each pattern against the response and bind its first capture group.
/// A pattern that fails to compile, does not match, or has no group leaves
/// the name unbound.
pub fn parse_regex_captures(
    response: &str,
    spec: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut result = HashMap::new();
    for (name, pattern) in spec {
        let re = match Regex::new(pattern) {
            Ok(re) => re,
            Err(e) => {
                log::debug!("[PARSE] skipping uncompilable pattern {:?}: {}", pattern, e);
                continue;
            }
        };
        if let Some(group) = re.captures(response).and_then(|caps| caps.get(1)) {
            result.insert(name.clone(), group.as_str().to_string());
        }
    }
    result
}

/// Extract the text between `left` and the next `right` after it.
///
/// Case-insensitive matching is ASCII-only so byte offsets into the original
/// string stay valid; the returned slice keeps its original case.
pub fn parse_lr(
    input: &str,
    left: &str,
    right: &str,
    case_sensitive: bool,
) -> Option<String> {
    lr_bounds(input, left, right, case_sensitive)
        .map(|(start, end)| input[start..end].to_string())
}

/// Repeat [`parse_lr`] from after each match, collecting every occurrence.
pub fn parse_lr_recursive(
    input: &str,
    left: &str,
    right: &str,
    case_sensitive: bool,
) -> Vec<String> {
    let mut results = Vec::new();
    let mut remaining = input;
    while let Some((start, end)) = lr_bounds(remaining, left, right, case_sensitive) {
        results.push(remaining[start..end].to_string());
        let advance = end + right.len();
        // Both boundaries empty match at position 0 without consuming input.
        if advance == 0 {
            break;
        }
        remaining = &remaining[advance..];
    }
    results
}

/// Byte range of the text between the boundaries, or None when either
/// boundary is absent. An empty boundary matches immediately, so empty
/// left and right bound an empty capture. ASCII lowercasing preserves
/// byte offsets, so the range stays valid for slicing the original input.
fn lr_bounds(
    input: &str,
    left: &str,
    right: &str,
    case_sensitive: bool,
) -> Option<(usize, usize)> {
    if case_sensitive {
        find_bounds(input, left, right)
    } else {
        find_bounds(
            &input.to_ascii_lowercase(),
            &left.to_ascii_lowercase(),
            &right.to_ascii_lowercase(),
        )
    }
}

fn find_bounds(haystack: &str, left: &str, right: &str) -> Option<(usize, usize)> {
    let left_idx = haystack.find(left)?;
    let start = left_idx + left.len();
    let right_idx = haystack[start..].find(right)?;
    Some((start, start + right_idx))
}
