//! Edge types for the configuration graph.
//!
//! Edges are directed and may form cycles. The set of kinds is open:
//! anything not named here travels as `Custom`.

use serde::{Deserialize, Serialize};

/// The type of relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// File is a member of an environment.
    BelongsTo,

    /// File refers to another file.
    References,

    /// Node groups another node.
    Contains,

    /// File inherits settings from another file.
    Extends,

    /// Any other relation, carried by name.
    #[serde(untagged)]
    Custom(String),
}

impl EdgeKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::BelongsTo => "belongs_to",
            Self::References => "references",
            Self::Contains => "contains",
            Self::Extends => "extends",
            Self::Custom(name) => name,
        }
    }
}

impl From<&str> for EdgeKind {
    fn from(s: &str) -> Self {
        match s {
            "belongs_to" => Self::BelongsTo,
            "references" => Self::References,
            "contains" => Self::Contains,
            "extends" => Self::Extends,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A directed relation between two node ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "edgeType")]
    pub kind: EdgeKind,
    pub label: Option<String>,
}

impl GraphEdge {
    /// Creates a new edge.
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
            label: None,
        }
    }

    /// Creates an edge carrying a label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}
