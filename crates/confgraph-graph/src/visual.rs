//! Visual records for a graph-drawing surface.
//!
//! `to_visual` maps a graph onto flat node and edge records that a
//! force-directed or hierarchical layout can consume. Icons come from a
//! fixed table keyed by file type and styles from a table keyed by node
//! variant; the graph itself carries no presentation data.

use crate::graph::ConfigGraph;
use crate::node::{GraphNode, NodeKind, NodeVariant};
use confgraph_core::FileType;
use serde::Serialize;

/// Icon shown on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IconKey {
    Json,
    Toml,
    Yaml,
    Yml,
    Typescript,
    Javascript,
    File,
    Environment,
    Module,
}

/// Icon for a file node of the given type.
pub fn file_icon(file_type: FileType) -> IconKey {
    match file_type {
        FileType::Json => IconKey::Json,
        FileType::Toml => IconKey::Toml,
        FileType::Yaml => IconKey::Yaml,
        FileType::Yml => IconKey::Yml,
        FileType::Ts => IconKey::Typescript,
        FileType::Js => IconKey::Javascript,
        FileType::Other => IconKey::File,
    }
}

/// Presentation treatment of a node variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStyle {
    pub class: &'static str,
    pub color: &'static str,
    pub shape: &'static str,
}

/// Style for each node variant.
pub fn variant_style(variant: NodeVariant) -> NodeStyle {
    match variant {
        NodeVariant::File => NodeStyle {
            class: "config-file",
            color: "#228be6",
            shape: "roundrectangle",
        },
        NodeVariant::Environment => NodeStyle {
            class: "config-environment",
            color: "#40c057",
            shape: "hexagon",
        },
        NodeVariant::Module => NodeStyle {
            class: "config-module",
            color: "#fab005",
            shape: "diamond",
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualNode {
    pub id: String,
    pub label: String,
    pub icon: IconKey,
    pub style: NodeStyle,
    /// Cluster key for colouring: the file type, or the variant name.
    pub group: String,
    /// Hover text.
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub kind: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VisualGraph {
    pub nodes: Vec<VisualNode>,
    pub edges: Vec<VisualEdge>,
}

impl VisualGraph {
    pub fn node(&self, id: &str) -> Option<&VisualNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Maps one node to its visual record.
pub fn visual_node(node: &GraphNode) -> VisualNode {
    let (icon, group, title) = match &node.kind {
        NodeKind::File(source) => (
            file_icon(source.file_type),
            source.file_type.as_str().to_string(),
            Some(source.path.clone()),
        ),
        NodeKind::Environment { .. } => (
            IconKey::Environment,
            NodeVariant::Environment.to_string(),
            node.description.clone(),
        ),
        NodeKind::Module { .. } => (
            IconKey::Module,
            NodeVariant::Module.to_string(),
            node.description.clone(),
        ),
    };

    VisualNode {
        id: node.id.clone(),
        label: node.label.clone(),
        icon,
        style: variant_style(node.variant()),
        group,
        title,
    }
}

/// Maps a whole graph. Every record refers to an id present in `graph`.
pub fn to_visual(graph: &ConfigGraph) -> VisualGraph {
    let mut nodes: Vec<VisualNode> = graph.nodes().map(|n| visual_node(n)).collect();
    nodes.sort_by(|a, b| a.id.cmp(&b.id));

    let mut edges: Vec<VisualEdge> = graph
        .edges()
        .map(|edge| VisualEdge {
            id: format!("{}->{}:{}", edge.source, edge.target, edge.kind),
            source: edge.source.clone(),
            target: edge.target.clone(),
            kind: edge.kind.to_string(),
            label: edge.label.clone(),
        })
        .collect();
    edges.sort_by(|a, b| a.id.cmp(&b.id));

    VisualGraph { nodes, edges }
}
