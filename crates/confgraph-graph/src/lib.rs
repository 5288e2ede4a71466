//! Confgraph Graph - Configuration relationship management
//!
//! This crate turns scanned configuration files and declared environments
//! into a navigable graph, and provides the operations a visual surface
//! needs on top of it: text search, key usage lookup, visibility filtering,
//! and mapping to drawable records.
//!
//! # Architecture
//!
//! The graph uses petgraph internally with an id index for lookups. Every
//! operation is a pure function over an immutable snapshot:
//! - `GraphBuilder::build` creates a graph from a scan
//! - `SearchIndex::build` indexes labels and keys of one graph
//! - `filter::apply` projects a graph onto the visible nodes
//! - `visual::to_visual` maps a graph onto drawable records
//!
//! # Example
//!
//! ```
//! use confgraph_core::{ConfigSourceFile, EnvironmentSpec, FileType};
//! use confgraph_graph::{apply, build, FilterState, SearchIndex};
//!
//! let sources = vec![
//!     ConfigSourceFile::new("/app/config.json", FileType::Json).with_keys(["db.host", "db.port"]),
//!     ConfigSourceFile::new("/app/env.ts", FileType::Ts).with_keys(["API_URL"]),
//! ];
//! let envs = vec![EnvironmentSpec::new("prod", ["/app/config.json"])];
//!
//! let graph = build(&sources, &envs).unwrap();
//! assert_eq!(graph.node_count(), 3);
//!
//! let index = SearchIndex::build(&graph);
//! assert_eq!(index.search_by_text("db.")[0].id, "file:/app/config.json");
//!
//! let filter = FilterState::all()
//!     .with_file_types([FileType::Json])
//!     .with_environments(false);
//! assert_eq!(apply(&graph, &filter).node_count(), 1);
//! ```

mod builder;
mod edge;
pub mod filter;
mod graph;
mod node;
mod path_table;
mod search_index;
mod store;
pub mod visual;

pub use builder::{build, GraphBuilder, RelationRule};
pub use edge::{EdgeKind, GraphEdge};
pub use filter::{apply, FilterState};
pub use graph::{ConfigGraph, GraphSnapshot, GraphStats, NodeId};
pub use node::{GraphNode, NodeKind, NodeVariant};
pub use petgraph::Direction;
pub use search_index::SearchIndex;
pub use store::{ScanStore, StoreError};
pub use visual::{to_visual, VisualEdge, VisualGraph, VisualNode};
