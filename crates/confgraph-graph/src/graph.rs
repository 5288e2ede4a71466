//! Core graph data structure.
//!
//! ConfigGraph wraps petgraph and adds an id index for fast lookups.
//! Nodes and edges are held behind `Arc` so that projections of a graph
//! (see `filter`) share them instead of copying.
//!
//! A graph is never patched after construction. A refresh builds a new one.

use crate::edge::{EdgeKind, GraphEdge};
use crate::node::{GraphNode, NodeVariant};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Index of a node inside one graph snapshot.
pub type NodeId = NodeIndex;

pub(crate) type Inner = DiGraph<Arc<GraphNode>, Arc<GraphEdge>>;

/// The configuration relationship graph.
#[derive(Debug, Clone, Default)]
pub struct ConfigGraph {
    /// The underlying petgraph graph.
    pub(crate) graph: Inner,

    /// Maps string ids to graph node indexes.
    id_index: HashMap<String, NodeId>,
}

impl ConfigGraph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already-assembled petgraph graph and indexes it.
    pub(crate) fn from_inner(graph: Inner) -> Self {
        let id_index = graph
            .node_indices()
            .map(|idx| (graph[idx].id.clone(), idx))
            .collect();
        Self { graph, id_index }
    }

    /// Adds a node. Returns the existing index if the id is already present.
    pub(crate) fn add_node(&mut self, node: Arc<GraphNode>) -> NodeId {
        if let Some(existing) = self.id_index.get(&node.id) {
            return *existing;
        }

        let id = node.id.clone();
        let index = self.graph.add_node(node);
        self.id_index.insert(id, index);
        index
    }

    /// Adds an edge between two nodes.
    pub(crate) fn add_edge(&mut self, from: NodeId, to: NodeId, edge: GraphEdge) {
        self.graph.add_edge(from, to, Arc::new(edge));
    }

    /// Gets a node by its string id.
    pub fn get_by_id(&self, id: &str) -> Option<&Arc<GraphNode>> {
        let index = self.id_index.get(id)?;
        self.graph.node_weight(*index)
    }

    /// Gets a node by its graph index.
    pub fn get(&self, index: NodeId) -> Option<&Arc<GraphNode>> {
        self.graph.node_weight(index)
    }

    /// Gets the node index for a string id.
    pub fn get_index(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.id_index.contains_key(id)
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Iterates over all nodes.
    pub fn nodes(&self) -> impl Iterator<Item = &Arc<GraphNode>> {
        self.graph.node_weights()
    }

    /// Iterates over all edges.
    pub fn edges(&self) -> impl Iterator<Item = &Arc<GraphEdge>> {
        self.graph.edge_weights()
    }

    /// Nodes adjacent to `id` in the given direction, optionally restricted
    /// to one edge kind.
    pub fn neighbors(
        &self,
        id: &str,
        direction: Direction,
        kind: Option<&EdgeKind>,
    ) -> Vec<&Arc<GraphNode>> {
        let Some(index) = self.get_index(id) else {
            return Vec::new();
        };

        let mut found: Vec<&Arc<GraphNode>> = self
            .graph
            .edges_directed(index, direction)
            .filter(|edge| kind.map_or(true, |k| &edge.weight().kind == k))
            .filter_map(|edge| {
                let other = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                self.graph.node_weight(other)
            })
            .collect();

        found.sort_by(|a, b| a.id.cmp(&b.id));
        found.dedup_by(|a, b| a.id == b.id);
        found
    }

    /// Files that belong to the environment with node id `env_id`.
    pub fn members_of(&self, env_id: &str) -> Vec<&Arc<GraphNode>> {
        self.neighbors(env_id, Direction::Incoming, Some(&EdgeKind::BelongsTo))
    }

    /// Environments the file with node id `file_id` belongs to.
    pub fn environments_of(&self, file_id: &str) -> Vec<&Arc<GraphNode>> {
        self.neighbors(file_id, Direction::Outgoing, Some(&EdgeKind::BelongsTo))
    }

    /// Returns a serializable copy of the graph, sorted for stable output.
    pub fn snapshot(&self) -> GraphSnapshot {
        let mut nodes: Vec<GraphNode> = self.nodes().map(|n| GraphNode::clone(n)).collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let mut edges: Vec<GraphEdge> = self.edges().map(|e| GraphEdge::clone(e)).collect();
        edges.sort();

        GraphSnapshot { nodes, edges }
    }

    /// Returns graph statistics.
    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            ..GraphStats::default()
        };

        for node in self.nodes() {
            match node.variant() {
                NodeVariant::File => {
                    stats.files += 1;
                    stats.keys += node.keys().len();
                }
                NodeVariant::Environment => stats.environments += 1,
                NodeVariant::Module => stats.modules += 1,
            }
        }

        stats
    }

    /// Checks that every edge endpoint is a node of this graph and that the
    /// edge's id fields agree with its endpoints.
    pub fn is_consistent(&self) -> bool {
        self.graph.edge_references().all(|edge_ref| {
            let source = self.graph.node_weight(edge_ref.source());
            let target = self.graph.node_weight(edge_ref.target());
            match (source, target) {
                (Some(s), Some(t)) => {
                    s.id == edge_ref.weight().source && t.id == edge_ref.weight().target
                }
                _ => false,
            }
        })
    }
}

/// Two graphs are equal when they hold the same node set and edge set.
impl PartialEq for ConfigGraph {
    fn eq(&self, other: &Self) -> bool {
        if self.node_count() != other.node_count() || self.edge_count() != other.edge_count() {
            return false;
        }

        let ours: BTreeMap<&str, &GraphNode> =
            self.nodes().map(|n| (n.id.as_str(), n.as_ref())).collect();
        let theirs: BTreeMap<&str, &GraphNode> =
            other.nodes().map(|n| (n.id.as_str(), n.as_ref())).collect();
        if ours != theirs {
            return false;
        }

        let mut our_edges: Vec<&GraphEdge> = self.edges().map(|e| e.as_ref()).collect();
        let mut their_edges: Vec<&GraphEdge> = other.edges().map(|e| e.as_ref()).collect();
        our_edges.sort();
        their_edges.sort();
        our_edges == their_edges
    }
}

impl Eq for ConfigGraph {}

/// Plain node/edge lists for export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Graph statistics for status output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub files: usize,
    pub environments: usize,
    pub modules: usize,
    pub keys: usize,
}
