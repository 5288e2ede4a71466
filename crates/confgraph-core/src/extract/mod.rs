//! Key extraction from configuration file content.
//!
//! Structured formats (JSON, TOML, YAML) are parsed and flattened into
//! dotted key paths. TS/JS config modules are parsed with Tree-sitter and
//! their exported configuration objects are flattened the same way.
//!
//! Extraction never fails: content that does not parse yields no keys, and
//! the file still becomes a graph node.

mod script;
mod structured;

use crate::source::FileType;

pub use script::extract_script_keys;
pub use structured::{extract_json_keys, extract_toml_keys, extract_yaml_keys};

/// Extracts the declared keys of a configuration file.
pub fn extract_keys(content: &str, file_type: FileType) -> Vec<String> {
    match file_type {
        FileType::Json => extract_json_keys(content),
        FileType::Toml => extract_toml_keys(content),
        FileType::Yaml | FileType::Yml => extract_yaml_keys(content),
        FileType::Ts | FileType::Js => extract_script_keys(content),
        FileType::Other => Vec::new(),
    }
}

/// Joins a parent key path and a child segment.
pub(crate) fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}
