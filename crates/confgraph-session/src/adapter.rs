//! Interaction half of the presentation contract.
//!
//! The adapter owns the user's filter selection and turns surface events
//! into session calls: visible graph, search-box input, node selection.

use crate::session::{ConfigSession, SessionError};
use confgraph_core::FileType;
use confgraph_graph::{
    apply, to_visual, visual::visual_node, FilterState, GraphNode, NodeKind, VisualGraph,
    VisualNode,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Preview of a file's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "camelCase")]
pub enum ContentPreview {
    Loaded(String),
    /// The fetch failed; the text describes why and replaces the preview.
    Unavailable(String),
}

/// Everything shown for a selected node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeDetail {
    #[serde(rename_all = "camelCase")]
    File {
        id: String,
        label: String,
        path: String,
        file_type: FileType,
        size_bytes: u64,
        modified_at_epoch_ms: u64,
        keys: Vec<String>,
        environments: Vec<String>,
        content: ContentPreview,
    },
    #[serde(rename_all = "camelCase")]
    Environment {
        id: String,
        label: String,
        description: Option<String>,
        members: Vec<String>,
    },
    Module { id: String, label: String },
}

pub struct PresentationAdapter {
    session: Arc<ConfigSession>,
    filter: FilterState,
}

impl PresentationAdapter {
    /// Starts with everything visible.
    pub fn new(session: Arc<ConfigSession>) -> Self {
        Self {
            session,
            filter: FilterState::default(),
        }
    }

    pub fn session(&self) -> &Arc<ConfigSession> {
        &self.session
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: FilterState) {
        self.filter = filter;
    }

    pub fn toggle_file_type(&mut self, file_type: FileType) {
        self.filter.toggle_file_type(file_type);
    }

    /// Visual records for the current snapshot under the current filter.
    pub async fn visual(&self) -> VisualGraph {
        let snapshot = self.session.snapshot().await;
        to_visual(&apply(snapshot.graph(), &self.filter))
    }

    /// Search-box input. Hits hidden by the filter are left out.
    pub async fn on_search_input(&self, text: &str) -> Result<Vec<VisualNode>, SessionError> {
        let hits = self.session.search(text).await?;
        debug!("Search '{}' matched {} nodes", text, hits.len());

        Ok(hits
            .iter()
            .filter(|node| self.filter.admits(node))
            .map(|node| visual_node(node))
            .collect())
    }

    /// Detail for a selected node, or `None` if the id is not in the
    /// current graph.
    ///
    /// Metadata comes from the graph. File content is fetched from the
    /// backend; a failed fetch becomes `ContentPreview::Unavailable`.
    pub async fn on_node_selected(&self, id: &str) -> Option<NodeDetail> {
        let snapshot = self.session.snapshot().await;
        let graph = snapshot.graph();
        let node: Arc<GraphNode> = graph.get_by_id(id)?.clone();

        let detail = match &node.kind {
            NodeKind::File(source) => {
                let content = match self.session.fetch_content(&source.path).await {
                    Ok(text) => ContentPreview::Loaded(text),
                    Err(e) => ContentPreview::Unavailable(e.to_string()),
                };

                NodeDetail::File {
                    id: node.id.clone(),
                    label: node.label.clone(),
                    path: source.path.clone(),
                    file_type: source.file_type,
                    size_bytes: source.size_bytes,
                    modified_at_epoch_ms: source.modified_at_epoch_ms,
                    keys: source.keys.clone(),
                    environments: graph
                        .environments_of(&node.id)
                        .into_iter()
                        .map(|env| env.id.clone())
                        .collect(),
                    content,
                }
            }
            NodeKind::Environment { .. } => NodeDetail::Environment {
                id: node.id.clone(),
                label: node.label.clone(),
                description: node.description.clone(),
                members: graph
                    .members_of(&node.id)
                    .into_iter()
                    .map(|member| member.id.clone())
                    .collect(),
            },
            NodeKind::Module { .. } => NodeDetail::Module {
                id: node.id.clone(),
                label: node.label.clone(),
            },
        };

        Some(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ConfigBackend;
    use async_trait::async_trait;
    use confgraph_core::{
        ConfigSourceFile, ContentFetchError, EnvironmentSpec, ScanError, ScanResult,
    };
    use confgraph_graph::GraphBuilder;

    struct StaticBackend;

    #[async_trait]
    impl ConfigBackend for StaticBackend {
        async fn scan_configs(&self) -> Result<ScanResult, ScanError> {
            Ok(ScanResult::new(
                vec![
                    ConfigSourceFile::new("/app/config.json", FileType::Json)
                        .with_keys(["db.host", "db.port"])
                        .with_metadata(120, 1_700_000_000_000),
                    ConfigSourceFile::new("/app/env.ts", FileType::Ts).with_keys(["API_URL"]),
                ],
                vec![EnvironmentSpec::new("prod", ["/app/config.json"])
                    .with_description("Live traffic")],
            ))
        }

        async fn get_file_content(&self, path: &str) -> Result<String, ContentFetchError> {
            match path {
                "/app/config.json" => Ok("{\"db\": {}}".to_string()),
                other => Err(ContentFetchError::PermissionDenied(other.to_string())),
            }
        }
    }

    async fn adapter() -> PresentationAdapter {
        let session = Arc::new(ConfigSession::new(
            Arc::new(StaticBackend),
            GraphBuilder::new(),
        ));
        session.refresh().await.unwrap();
        PresentationAdapter::new(session)
    }

    #[tokio::test]
    async fn test_visual_follows_filter() {
        let mut adapter = adapter().await;
        assert_eq!(adapter.visual().await.nodes.len(), 3);

        adapter.set_filter(
            FilterState::all()
                .with_file_types([FileType::Json])
                .with_environments(false),
        );
        let visual = adapter.visual().await;
        assert_eq!(visual.nodes.len(), 1);
        assert!(visual.edges.is_empty());
    }

    #[tokio::test]
    async fn test_search_input_respects_filter() {
        let mut adapter = adapter().await;
        let hits = adapter.on_search_input("app").await.unwrap();
        assert!(hits.is_empty(), "paths are not searched");

        let hits = adapter.on_search_input("API").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "file:/app/env.ts");

        adapter.toggle_file_type(FileType::Ts);
        assert!(adapter.on_search_input("API").await.unwrap().is_empty());
        assert!(adapter.on_search_input("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_select_file_node() {
        let adapter = adapter().await;
        let detail = adapter
            .on_node_selected("file:/app/config.json")
            .await
            .unwrap();

        match detail {
            NodeDetail::File {
                size_bytes,
                keys,
                environments,
                content,
                ..
            } => {
                assert_eq!(size_bytes, 120);
                assert_eq!(keys, vec!["db.host", "db.port"]);
                assert_eq!(environments, vec!["env:prod"]);
                assert_eq!(content, ContentPreview::Loaded("{\"db\": {}}".to_string()));
            }
            other => panic!("expected file detail, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_content_failure_is_inline() {
        let adapter = adapter().await;
        let detail = adapter.on_node_selected("file:/app/env.ts").await.unwrap();

        let NodeDetail::File { content, keys, .. } = detail else {
            panic!("expected file detail");
        };
        assert_eq!(keys, vec!["API_URL"]);
        assert!(matches!(
            content,
            ContentPreview::Unavailable(ref msg) if msg.contains("Permission denied")
        ));

        // Other nodes are unaffected.
        let config = adapter.on_node_selected("file:/app/config.json").await;
        assert!(matches!(
            config,
            Some(NodeDetail::File {
                content: ContentPreview::Loaded(_),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_select_environment_and_unknown() {
        let adapter = adapter().await;
        let detail = adapter.on_node_selected("env:prod").await.unwrap();
        assert_eq!(
            detail,
            NodeDetail::Environment {
                id: "env:prod".to_string(),
                label: "prod".to_string(),
                description: Some("Live traffic".to_string()),
                members: vec!["file:/app/config.json".to_string()],
            }
        );

        assert!(adapter.on_node_selected("file:/nope.json").await.is_none());
    }
}
