//! Path lookups used while building a graph.

use crate::graph::NodeId;
use std::collections::{BTreeMap, HashMap};

/// A table of file nodes for resolving path references during a build.
///
/// Maps absolute paths to node ids, and groups files by directory so that
/// relation rules can pair files living side by side.
/// Example: "/app/package.json" -> NodeId(3), "/app" -> [("package.json", 3)]
#[derive(Debug, Default, Clone)]
pub struct PathTable {
    /// Map of path to NodeId
    by_path: HashMap<String, NodeId>,

    /// Map of directory to (file name, NodeId), directories in sorted order.
    by_directory: BTreeMap<String, Vec<(String, NodeId)>>,
}

impl PathTable {
    /// Creates a new empty path table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a file node.
    ///
    /// * `path` - Absolute path of the file
    /// * `directory` - Parent directory of the file
    /// * `file_name` - Last path component
    /// * `id` - The node id in the graph
    pub fn insert(&mut self, path: &str, directory: &str, file_name: &str, id: NodeId) {
        self.by_path.insert(path.to_string(), id);
        self.by_directory
            .entry(directory.to_string())
            .or_default()
            .push((file_name.to_string(), id));
    }

    /// Resolves a path to a node id.
    pub fn resolve(&self, path: &str) -> Option<NodeId> {
        self.by_path.get(path).copied()
    }

    /// Returns the files named `file_name` in every directory, grouped per
    /// directory in sorted directory order.
    pub fn named_in_each_directory<'a>(
        &'a self,
        file_name: &'a str,
    ) -> impl Iterator<Item = (&'a str, Vec<NodeId>)> + 'a {
        self.by_directory.iter().filter_map(move |(dir, files)| {
            let ids: Vec<NodeId> = files
                .iter()
                .filter(|(name, _)| name == file_name)
                .map(|(_, id)| *id)
                .collect();
            (!ids.is_empty()).then_some((dir.as_str(), ids))
        })
    }

    /// Returns the files named `file_name` inside `directory`.
    pub fn named_in(&self, directory: &str, file_name: &str) -> Vec<NodeId> {
        self.by_directory
            .get(directory)
            .map(|files| {
                files
                    .iter()
                    .filter(|(name, _)| name == file_name)
                    .map(|(_, id)| *id)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of registered paths.
    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}
