//! Graph builder for constructing the configuration graph from a scan.
//!
//! The builder takes scanned files and declared environments and turns
//! them into nodes and edges:
//! 1. Validate the input (unique paths, unique environment names, no
//!    dangling environment members)
//! 2. Add one node per file and per environment
//! 3. Add `belongs_to` edges from member files to their environments
//! 4. Apply relation rules between files living in the same directory
//!
//! Inputs are sorted before use, so the result does not depend on the
//! order of `sources` or `environments`.

use crate::edge::{EdgeKind, GraphEdge};
use crate::graph::{ConfigGraph, NodeId};
use crate::node::GraphNode;
use crate::path_table::PathTable;
use confgraph_core::{BuildError, ConfigSourceFile, EnvironmentSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Pairs files by name: every `from` file gets an edge to the `to` file
/// in the same directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRule {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
    #[serde(default)]
    pub label: Option<String>,
}

impl RelationRule {
    pub fn new(from: impl Into<String>, to: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The relations every front-end/Tauri project tends to have.
    pub fn defaults() -> Vec<RelationRule> {
        [
            ("package.json", "tsconfig.json"),
            ("vite.config.ts", "package.json"),
            ("tailwind.config.js", "package.json"),
            ("Cargo.toml", "tauri.conf.json"),
            ("vite.config.ts", "tauri.conf.json"),
        ]
        .into_iter()
        .map(|(from, to)| RelationRule::new(from, to, EdgeKind::References).with_label("references"))
        .collect()
    }
}

/// Builds a ConfigGraph from one scan.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    rules: Vec<RelationRule>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    /// Creates a builder with the default relation rules.
    pub fn new() -> Self {
        Self {
            rules: RelationRule::defaults(),
        }
    }

    /// Creates a builder with the given relation rules only.
    pub fn with_rules(rules: Vec<RelationRule>) -> Self {
        Self { rules }
    }

    /// Creates a builder that only emits environment membership edges.
    pub fn without_relations() -> Self {
        Self::with_rules(Vec::new())
    }

    pub fn rules(&self) -> &[RelationRule] {
        &self.rules
    }

    /// Builds the graph.
    ///
    /// # Errors
    ///
    /// Returns `BuildError` on duplicate source paths, duplicate environment
    /// names, or an environment member that is not among `sources`. Nothing
    /// is dropped silently.
    pub fn build(
        &self,
        sources: &[ConfigSourceFile],
        environments: &[EnvironmentSpec],
    ) -> Result<ConfigGraph, BuildError> {
        let mut sources: Vec<&ConfigSourceFile> = sources.iter().collect();
        sources.sort_by(|a, b| a.path.cmp(&b.path));
        if let Some(pair) = sources.windows(2).find(|w| w[0].path == w[1].path) {
            return Err(BuildError::DuplicateSource(pair[0].path.clone()));
        }

        let mut environments: Vec<&EnvironmentSpec> = environments.iter().collect();
        environments.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(pair) = environments.windows(2).find(|w| w[0].name == w[1].name) {
            return Err(BuildError::DuplicateEnvironment(pair[0].name.clone()));
        }

        let mut graph = ConfigGraph::new();
        let mut paths = PathTable::new();

        for source in &sources {
            let node = GraphNode::file(ConfigSourceFile::clone(source));
            let idx = graph.add_node(Arc::new(node));
            paths.insert(&source.path, source.directory(), source.file_name(), idx);
        }

        // Resolve every membership before touching the graph further so a
        // dangling reference is reported against a clean state.
        let mut memberships: Vec<(NodeId, &EnvironmentSpec)> = Vec::new();
        for env in &environments {
            let members: BTreeSet<&str> = env.member_paths.iter().map(String::as_str).collect();
            for path in members {
                let idx = paths.resolve(path).ok_or_else(|| BuildError::DanglingMember {
                    environment: env.name.clone(),
                    path: path.to_string(),
                })?;
                memberships.push((idx, env));
            }
        }

        for env in &environments {
            graph.add_node(Arc::new(GraphNode::environment(env)));
        }

        for (file_idx, env) in memberships {
            let env_id = GraphNode::environment_id(&env.name);
            let Some(env_idx) = graph.get_index(&env_id) else {
                continue;
            };
            let file_id = graph.get(file_idx).map(|n| n.id.clone()).unwrap_or_default();
            graph.add_edge(
                file_idx,
                env_idx,
                GraphEdge::new(file_id, env_id, EdgeKind::BelongsTo),
            );
        }

        self.apply_rules(&mut graph, &paths);

        debug!(
            "Built config graph: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        Ok(graph)
    }

    /// Adds edges for every relation rule. Duplicate edges are collapsed.
    fn apply_rules(&self, graph: &mut ConfigGraph, paths: &PathTable) {
        let mut seen: BTreeSet<(NodeId, NodeId, EdgeKind)> = BTreeSet::new();
        let mut edges_to_add = Vec::new();

        for rule in &self.rules {
            for (dir, from_ids) in paths.named_in_each_directory(&rule.from) {
                let to_ids = paths.named_in(dir, &rule.to);
                for &from in &from_ids {
                    for &to in &to_ids {
                        if from != to && seen.insert((from, to, rule.kind.clone())) {
                            edges_to_add.push((from, to, rule));
                        }
                    }
                }
            }
        }

        for (from, to, rule) in edges_to_add {
            let (Some(source), Some(target)) = (graph.get(from), graph.get(to)) else {
                continue;
            };
            let mut edge = GraphEdge::new(source.id.clone(), target.id.clone(), rule.kind.clone());
            edge.label = rule.label.clone();
            graph.add_edge(from, to, edge);
        }
    }
}

/// Builds a graph with the default relation rules.
pub fn build(
    sources: &[ConfigSourceFile],
    environments: &[EnvironmentSpec],
) -> Result<ConfigGraph, BuildError> {
    GraphBuilder::new().build(sources, environments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use confgraph_core::FileType;

    fn json(path: &str) -> ConfigSourceFile {
        ConfigSourceFile::new(path, FileType::Json)
    }

    #[test]
    fn test_builder_adds_nodes() {
        let sources = vec![json("/a.json"), json("/b.json")];
        let graph = build(&sources, &[]).unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_builder_adds_membership_edges() {
        let sources = vec![json("/a.json"), json("/b.json")];
        let envs = vec![
            EnvironmentSpec::new("prod", ["/a.json", "/b.json"]),
            EnvironmentSpec::new("dev", ["/a.json"]),
        ];
        let graph = build(&sources, &envs).unwrap();

        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.members_of("env:prod").len(), 2);
        assert_eq!(graph.environments_of("file:/a.json").len(), 2);
        assert!(graph.is_consistent());
    }

    #[test]
    fn test_repeated_member_is_one_edge() {
        let sources = vec![json("/a.json")];
        let envs = vec![EnvironmentSpec::new("prod", ["/a.json", "/a.json"])];
        let graph = build(&sources, &envs).unwrap();
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_duplicate_environment_fails() {
        let sources = vec![json("/a.json")];
        let envs = vec![
            EnvironmentSpec::new("prod", ["/a.json"]),
            EnvironmentSpec::new("prod", Vec::<String>::new()),
        ];
        let err = build(&sources, &envs).unwrap_err();
        assert_eq!(err, BuildError::DuplicateEnvironment("prod".into()));
    }

    #[test]
    fn test_dangling_member_fails() {
        let sources = vec![json("/a.json")];
        let envs = vec![EnvironmentSpec::new("prod", ["/missing.json"])];
        let err = build(&sources, &envs).unwrap_err();
        assert_eq!(
            err,
            BuildError::DanglingMember {
                environment: "prod".into(),
                path: "/missing.json".into(),
            }
        );
    }

    #[test]
    fn test_duplicate_source_fails() {
        let sources = vec![json("/a.json"), json("/a.json")];
        let err = build(&sources, &[]).unwrap_err();
        assert_eq!(err, BuildError::DuplicateSource("/a.json".into()));
    }

    #[test]
    fn test_relation_rules_pair_files_per_directory() {
        let sources = vec![
            json("/web/package.json"),
            json("/web/tsconfig.json"),
            json("/api/package.json"),
            json("/other/tsconfig.json"),
        ];
        let graph = build(&sources, &[]).unwrap();

        assert_eq!(graph.edge_count(), 1);
        let edge = graph.edges().next().unwrap();
        assert_eq!(edge.source, "file:/web/package.json");
        assert_eq!(edge.target, "file:/web/tsconfig.json");
        assert_eq!(edge.kind, EdgeKind::References);
        assert_eq!(edge.label.as_deref(), Some("references"));
    }

    #[test]
    fn test_without_relations() {
        let sources = vec![json("/web/package.json"), json("/web/tsconfig.json")];
        let graph = GraphBuilder::without_relations().build(&sources, &[]).unwrap();
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_custom_rule_allows_cycles() {
        let sources = vec![json("/x/a.json"), json("/x/b.json")];
        let builder = GraphBuilder::with_rules(vec![
            RelationRule::new("a.json", "b.json", EdgeKind::Extends),
            RelationRule::new("b.json", "a.json", EdgeKind::Extends),
        ]);
        let graph = builder.build(&sources, &[]).unwrap();
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.is_consistent());
    }
}
