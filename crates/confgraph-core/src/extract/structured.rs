//! JSON, TOML and YAML key flattening.

use super::join_key;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

/// Flattens a JSON document into dotted keys, arrays as `key[i]`.
pub fn extract_json_keys(content: &str) -> Vec<String> {
    let mut keys = Vec::new();

    match serde_json::from_str::<JsonValue>(content) {
        Ok(value) => walk_json(&value, "", &mut keys),
        Err(e) => debug!("Skipping unparseable JSON: {}", e),
    }

    keys
}

fn walk_json(value: &JsonValue, prefix: &str, keys: &mut Vec<String>) {
    match value {
        JsonValue::Object(obj) => {
            for (key, child) in obj {
                let full = join_key(prefix, key);
                keys.push(full.clone());
                walk_json(child, &full, keys);
            }
        }
        JsonValue::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                walk_json(child, &format!("{}[{}]", prefix, i), keys);
            }
        }
        _ => {}
    }
}

/// Flattens a TOML document. Tables and plain values both emit their path.
pub fn extract_toml_keys(content: &str) -> Vec<String> {
    let mut keys = Vec::new();

    match content.parse::<toml::Table>() {
        Ok(table) => walk_toml_table(&table, "", &mut keys),
        Err(e) => debug!("Skipping unparseable TOML: {}", e),
    }

    keys
}

fn walk_toml_table(table: &toml::Table, prefix: &str, keys: &mut Vec<String>) {
    for (key, value) in table {
        let full = join_key(prefix, key);
        keys.push(full.clone());
        walk_toml_value(value, &full, keys);
    }
}

fn walk_toml_value(value: &toml::Value, prefix: &str, keys: &mut Vec<String>) {
    match value {
        toml::Value::Table(table) => walk_toml_table(table, prefix, keys),
        toml::Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                walk_toml_value(child, &format!("{}[{}]", prefix, i), keys);
            }
        }
        _ => {}
    }
}

/// Flattens every document of a YAML stream.
pub fn extract_yaml_keys(content: &str) -> Vec<String> {
    let mut keys = Vec::new();

    for document in serde_yaml::Deserializer::from_str(content) {
        match serde_yaml::Value::deserialize(document) {
            Ok(value) => walk_yaml(&value, "", &mut keys),
            Err(e) => {
                debug!("Skipping unparseable YAML document: {}", e);
                break;
            }
        }
    }

    keys
}

fn walk_yaml(value: &serde_yaml::Value, prefix: &str, keys: &mut Vec<String>) {
    use serde_yaml::Value;

    match value {
        Value::Mapping(map) => {
            for (key, child) in map {
                let key = match key {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => continue,
                };
                let full = join_key(prefix, &key);
                keys.push(full.clone());
                walk_yaml(child, &full, keys);
            }
        }
        Value::Sequence(items) => {
            for (i, child) in items.iter().enumerate() {
                walk_yaml(child, &format!("{}[{}]", prefix, i), keys);
            }
        }
        Value::Tagged(tagged) => walk_yaml(&tagged.value, prefix, keys),
        _ => {}
    }
}
