//! Visibility filtering.
//!
//! `apply` projects a graph onto the nodes a `FilterState` admits. Edges
//! follow their endpoints: an edge survives exactly when both ends do.
//! The projection shares node and edge allocations with its input.

use crate::graph::ConfigGraph;
use crate::node::{GraphNode, NodeKind};
use confgraph_core::FileType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// User-controlled visibility predicate. The default shows everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub show_files: bool,
    pub show_modules: bool,
    pub show_environments: bool,
    /// File types whose nodes stay visible.
    pub file_types: BTreeSet<FileType>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            show_files: true,
            show_modules: true,
            show_environments: true,
            file_types: FileType::ALL.into_iter().collect(),
        }
    }
}

impl FilterState {
    /// Shows every variant and every file type.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restricts visible file types.
    pub fn with_file_types<I: IntoIterator<Item = FileType>>(mut self, types: I) -> Self {
        self.file_types = types.into_iter().collect();
        self
    }

    pub fn with_files(mut self, show: bool) -> Self {
        self.show_files = show;
        self
    }

    pub fn with_modules(mut self, show: bool) -> Self {
        self.show_modules = show;
        self
    }

    pub fn with_environments(mut self, show: bool) -> Self {
        self.show_environments = show;
        self
    }

    /// Flips one file type on or off.
    pub fn toggle_file_type(&mut self, file_type: FileType) {
        if !self.file_types.remove(&file_type) {
            self.file_types.insert(file_type);
        }
    }

    /// Whether the node is visible under this filter.
    pub fn admits(&self, node: &GraphNode) -> bool {
        match &node.kind {
            NodeKind::File(source) => {
                self.show_files && self.file_types.contains(&source.file_type)
            }
            NodeKind::Environment { .. } => self.show_environments,
            NodeKind::Module { .. } => self.show_modules,
        }
    }
}

/// Projects `graph` onto the nodes `filter` admits.
///
/// Never mutates the input. Edges with a removed endpoint are dropped.
pub fn apply(graph: &ConfigGraph, filter: &FilterState) -> ConfigGraph {
    let projected = graph.graph.filter_map(
        |_, node| filter.admits(node).then(|| Arc::clone(node)),
        |_, edge| Some(Arc::clone(edge)),
    );
    ConfigGraph::from_inner(projected)
}
