//! Scanned configuration sources.
//!
//! A `ConfigSourceFile` is produced by an external scan and never changes
//! afterwards. A re-scan replaces the whole set.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// The kind of configuration file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Json,
    Toml,
    Yaml,
    Yml,
    Ts,
    Js,
    Other,
}

impl FileType {
    /// Every file type, in declaration order.
    pub const ALL: [FileType; 7] = [
        FileType::Json,
        FileType::Toml,
        FileType::Yaml,
        FileType::Yml,
        FileType::Ts,
        FileType::Js,
        FileType::Other,
    ];

    /// Maps a file extension (without the dot) to a file type.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            "toml" => Self::Toml,
            "yaml" => Self::Yaml,
            "yml" => Self::Yml,
            "ts" | "mts" | "cts" => Self::Ts,
            "js" | "mjs" | "cjs" => Self::Js,
            _ => Self::Other,
        }
    }

    /// Classifies a path by its extension.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Toml => "toml",
            Self::Yaml => "yaml",
            Self::Yml => "yml",
            Self::Ts => "ts",
            Self::Js => "js",
            Self::Other => "other",
        }
    }

    /// Human-readable name for detail panels.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Toml => "TOML",
            Self::Yaml => "YAML",
            Self::Yml => "YML",
            Self::Ts => "TypeScript",
            Self::Js => "JavaScript",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown file type: {}", s))
    }
}

/// One scanned configuration file.
///
/// `path` is the identity key. Keys keep their declaration order and may
/// repeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSourceFile {
    /// Absolute path of the file.
    pub path: String,
    pub file_type: FileType,
    pub size_bytes: u64,
    pub modified_at_epoch_ms: u64,
    /// Configuration keys declared in the file.
    pub keys: Vec<String>,
}

impl ConfigSourceFile {
    pub fn new(path: impl Into<String>, file_type: FileType) -> Self {
        Self {
            path: path.into(),
            file_type,
            size_bytes: 0,
            modified_at_epoch_ms: 0,
            keys: Vec::new(),
        }
    }

    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata(mut self, size_bytes: u64, modified_at_epoch_ms: u64) -> Self {
        self.size_bytes = size_bytes;
        self.modified_at_epoch_ms = modified_at_epoch_ms;
        self
    }

    /// The last path component, used as the default node label.
    pub fn file_name(&self) -> &str {
        Path::new(&self.path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.path)
    }

    /// The parent directory, or an empty string for bare names.
    pub fn directory(&self) -> &str {
        Path::new(&self.path)
            .parent()
            .and_then(|p| p.to_str())
            .unwrap_or("")
    }
}

/// A declared environment: a named group of scanned files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSpec {
    pub name: String,
    /// Display label. Falls back to `name`.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Paths of the member files; each must appear in the scan.
    #[serde(default)]
    pub member_paths: Vec<String>,
}

impl EnvironmentSpec {
    pub fn new<I, S>(name: impl Into<String>, member_paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            label: None,
            description: None,
            member_paths: member_paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Everything one scan produces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub sources: Vec<ConfigSourceFile>,
    pub environments: Vec<EnvironmentSpec>,
}

impl ScanResult {
    pub fn new(sources: Vec<ConfigSourceFile>, environments: Vec<EnvironmentSpec>) -> Self {
        Self {
            sources,
            environments,
        }
    }

    /// Total number of declared keys across all sources.
    pub fn key_count(&self) -> usize {
        self.sources.iter().map(|s| s.keys.len()).sum()
    }
}
