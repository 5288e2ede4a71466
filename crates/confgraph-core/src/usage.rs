//! Key usage results and text-level usage scanning.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A concrete occurrence of a configuration key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageLocation {
    pub file: String,
    /// 1-based line, when known.
    pub line: Option<usize>,
    /// 1-based column in characters, when known.
    pub column: Option<usize>,
    /// Surrounding text snippet.
    pub context: String,
}

/// All usages of one key inside one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSearchResult {
    pub key: String,
    pub file: String,
    pub value: Option<String>,
    pub usages: Vec<UsageLocation>,
}

/// Finds every line of `content` that mentions `key`.
///
/// The column points at the first occurrence on each line.
pub fn locate_usages(content: &str, key: &str, file: &str) -> Vec<UsageLocation> {
    if key.is_empty() {
        return Vec::new();
    }

    content
        .lines()
        .enumerate()
        .filter_map(|(line_idx, line)| {
            let byte_col = line.find(key)?;
            Some(UsageLocation {
                file: file.to_string(),
                line: Some(line_idx + 1),
                column: Some(line[..byte_col].chars().count() + 1),
                context: line.trim().to_string(),
            })
        })
        .collect()
}

/// Resolves the value of a dotted key inside file content.
///
/// JSON documents are walked structurally (`a.b[0].c`). Anything else
/// falls back to a line-oriented `key: value` / `key = value` match.
pub fn extract_value(content: &str, key: &str) -> Option<String> {
    if let Ok(json) = serde_json::from_str::<JsonValue>(content) {
        return extract_json_value(&json, key);
    }

    let quoted = format!("\"{}\"", key);
    for line in content.lines() {
        let line = line.trim();
        let rest = if let Some(rest) = line.strip_prefix(&quoted) {
            rest
        } else if let Some(rest) = line.strip_prefix(key) {
            rest
        } else {
            continue;
        };

        let rest = rest.trim_start();
        let value = rest.strip_prefix(':').or_else(|| rest.strip_prefix('='));
        if let Some(value) = value {
            let value = value.trim().trim_end_matches(',').trim_matches('"');
            return Some(value.to_string());
        }
    }

    None
}

fn extract_json_value(json: &JsonValue, key: &str) -> Option<String> {
    let mut current = json;

    for segment in key.split('.') {
        let (name, indexes) = split_indexes(segment)?;
        if !name.is_empty() {
            current = current.as_object()?.get(name)?;
        }
        for index in indexes {
            current = current.as_array()?.get(index)?;
        }
    }

    match current {
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Splits `name[1][2]` into `("name", [1, 2])`.
fn split_indexes(segment: &str) -> Option<(&str, Vec<usize>)> {
    let name_end = segment.find('[').unwrap_or(segment.len());
    let (name, mut rest) = segment.split_at(name_end);
    let mut indexes = Vec::new();

    while let Some(stripped) = rest.strip_prefix('[') {
        let close = stripped.find(']')?;
        indexes.push(stripped[..close].parse().ok()?);
        rest = &stripped[close + 1..];
    }

    if !rest.is_empty() {
        return None;
    }

    Some((name, indexes))
}
