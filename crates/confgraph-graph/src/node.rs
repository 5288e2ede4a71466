//! Graph nodes.
//!
//! A node is either a scanned file, a declared environment, or a module.
//! Module nodes are part of the vocabulary (the filter has a flag for
//! them) but nothing produces them yet.

use confgraph_core::{ConfigSourceFile, EnvironmentSpec};
use serde::{Deserialize, Serialize};

/// Prefix of file node ids.
pub const FILE_ID_PREFIX: &str = "file:";
/// Prefix of environment node ids.
pub const ENVIRONMENT_ID_PREFIX: &str = "env:";
/// Prefix of module node ids.
pub const MODULE_ID_PREFIX: &str = "module:";

/// The payload of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// A scanned configuration file.
    File(ConfigSourceFile),
    /// A named group of files, such as "production".
    Environment { name: String },
    /// Reserved for logical-unit grouping.
    Module { name: String },
}

/// Payload-free discriminant of `NodeKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeVariant {
    File,
    Environment,
    Module,
}

impl std::fmt::Display for NodeVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::File => "file",
            Self::Environment => "environment",
            Self::Module => "module",
        };
        write!(f, "{}", s)
    }
}

/// A visualizable entity in the configuration graph.
///
/// The id is derived from content (path or name), never from insertion
/// order, so it survives a re-scan that keeps the path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub kind: NodeKind,
}

impl GraphNode {
    /// Creates a file node labelled with the file name.
    pub fn file(source: ConfigSourceFile) -> Self {
        Self {
            id: Self::file_id(&source.path),
            label: source.file_name().to_string(),
            description: None,
            kind: NodeKind::File(source),
        }
    }

    /// Creates an environment node from its declaration.
    pub fn environment(spec: &EnvironmentSpec) -> Self {
        Self {
            id: Self::environment_id(&spec.name),
            label: spec.label.clone().unwrap_or_else(|| spec.name.clone()),
            description: spec.description.clone(),
            kind: NodeKind::Environment {
                name: spec.name.clone(),
            },
        }
    }

    /// Creates a module node.
    pub fn module(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: format!("{}{}", MODULE_ID_PREFIX, name),
            label: name.clone(),
            description: None,
            kind: NodeKind::Module { name },
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The node id of the file at `path`.
    pub fn file_id(path: &str) -> String {
        format!("{}{}", FILE_ID_PREFIX, path)
    }

    /// The node id of the environment called `name`.
    pub fn environment_id(name: &str) -> String {
        format!("{}{}", ENVIRONMENT_ID_PREFIX, name)
    }

    pub fn variant(&self) -> NodeVariant {
        match self.kind {
            NodeKind::File(_) => NodeVariant::File,
            NodeKind::Environment { .. } => NodeVariant::Environment,
            NodeKind::Module { .. } => NodeVariant::Module,
        }
    }

    /// The wrapped source, for file nodes.
    pub fn as_file(&self) -> Option<&ConfigSourceFile> {
        match &self.kind {
            NodeKind::File(source) => Some(source),
            _ => None,
        }
    }

    /// Declared keys. Empty for anything but file nodes.
    pub fn keys(&self) -> &[String] {
        self.as_file().map(|s| s.keys.as_slice()).unwrap_or(&[])
    }
}
