//! The owned session: current snapshot, refresh and notifications.
//!
//! A session holds exactly one `SessionSnapshot` at a time. Refresh builds a
//! complete new snapshot off to the side and swaps it in; readers holding
//! the old `Arc` finish against the old one. A failed refresh leaves the
//! current snapshot in place.

use crate::backend::ConfigBackend;
use confgraph_core::{
    extract_value, locate_usages, BuildError, ConfigSearchResult, ContentFetchError, ScanError,
    ScanResult,
};
use confgraph_graph::{ConfigGraph, GraphBuilder, GraphNode, ScanStore, SearchIndex, StoreError};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("Scan store error: {0}")]
    Store(#[from] StoreError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum SessionEvent {
    /// A new snapshot replaced the previous one.
    GraphReplaced {
        generation: u64,
        node_count: usize,
        edge_count: usize,
    },
    /// A refresh failed; the previous snapshot is still current.
    RefreshFailed { message: String },
    /// A refresh was requested while another one was in flight.
    RefreshSkipped,
}

/// What a refresh request did.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    Replaced(Arc<SessionSnapshot>),
    Skipped,
}

/// One immutable graph state and the index built over it.
#[derive(Debug, Default)]
pub struct SessionSnapshot {
    generation: u64,
    scan: ScanResult,
    graph: ConfigGraph,
    index: SearchIndex,
}

impl SessionSnapshot {
    /// Builds the graph and its index for one scan.
    pub fn build(
        builder: &GraphBuilder,
        scan: ScanResult,
        generation: u64,
    ) -> Result<Self, BuildError> {
        let graph = builder.build(&scan.sources, &scan.environments)?;
        let index = SearchIndex::build(&graph);
        Ok(Self {
            generation,
            scan,
            graph,
            index,
        })
    }

    /// 0 for the initial empty snapshot, increasing with each replacement.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn scan(&self) -> &ScanResult {
        &self.scan
    }

    pub fn graph(&self) -> &ConfigGraph {
        &self.graph
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }
}

/// Resets the in-flight flag when a refresh ends, however it ends.
struct RefreshGuard<'a>(&'a AtomicBool);

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Process-wide state for one connected project.
pub struct ConfigSession {
    backend: Arc<dyn ConfigBackend>,
    builder: GraphBuilder,
    current: RwLock<Arc<SessionSnapshot>>,
    refreshing: AtomicBool,
    generation: AtomicU64,
    events: broadcast::Sender<SessionEvent>,
    store: Option<ScanStore>,
}

impl ConfigSession {
    /// Creates a session with an empty snapshot. Nothing is scanned until
    /// the first `refresh`.
    pub fn new(backend: Arc<dyn ConfigBackend>, builder: GraphBuilder) -> Self {
        let (events, _) = broadcast::channel(64);

        Self {
            backend,
            builder,
            current: RwLock::new(Arc::new(SessionSnapshot::default())),
            refreshing: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            events,
            store: None,
        }
    }

    /// Persists each successful scan to `store`.
    pub fn with_store(mut self, store: ScanStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn store(&self) -> Option<&ScanStore> {
        self.store.as_ref()
    }

    /// Returns a receiver for session notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Returns the current snapshot.
    pub async fn snapshot(&self) -> Arc<SessionSnapshot> {
        self.current.read().await.clone()
    }

    /// Whether a refresh is currently running.
    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    /// Loads the last good scan from the store, if the session has not been
    /// refreshed yet. Returns whether a stored scan was installed.
    pub async fn seed_from_store(&self) -> Result<bool, SessionError> {
        let Some(store) = &self.store else {
            return Ok(false);
        };
        let Some(scan) = store.load_scan()? else {
            return Ok(false);
        };

        let builder = self.current_builder().await;
        let mut current = self.current.write().await;
        if current.generation() != 0 {
            return Ok(false);
        }

        let mut snapshot = SessionSnapshot::build(&builder, scan, 0)?;
        snapshot.generation = self.next_generation();
        info!(
            "Seeded session from stored scan ({} files)",
            snapshot.scan().sources.len()
        );
        *current = Arc::new(snapshot);
        self.announce(&current);
        Ok(true)
    }

    /// Re-scans through the backend and replaces the snapshot.
    ///
    /// A request made while another refresh is running is ignored and
    /// reported as `Skipped`. On a scan or build failure the previous
    /// snapshot stays current, a `RefreshFailed` event is sent, and the
    /// error is returned.
    pub async fn refresh(&self) -> Result<RefreshOutcome, SessionError> {
        if self
            .refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Refresh already in flight, ignoring request");
            let _ = self.events.send(SessionEvent::RefreshSkipped);
            return Ok(RefreshOutcome::Skipped);
        }
        let _guard = RefreshGuard(&self.refreshing);

        match self.run_refresh().await {
            Ok(snapshot) => Ok(RefreshOutcome::Replaced(snapshot)),
            Err(e) => {
                warn!("Refresh failed, keeping previous graph: {}", e);
                let _ = self.events.send(SessionEvent::RefreshFailed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn run_refresh(&self) -> Result<Arc<SessionSnapshot>, SessionError> {
        let scan = self.backend.scan_configs().await?;
        let builder = self.current_builder().await;
        let store = self.store.clone();

        let mut snapshot = tokio::task::spawn_blocking(move || {
            let snapshot = SessionSnapshot::build(&builder, scan, 0)?;
            if let Some(store) = store {
                if let Err(e) = store.save_scan(snapshot.scan()) {
                    warn!("Failed to persist scan: {}", e);
                }
            }
            Ok::<_, BuildError>(snapshot)
        })
        .await??;

        let mut current = self.current.write().await;
        snapshot.generation = self.next_generation();
        let snapshot = Arc::new(snapshot);
        *current = snapshot.clone();
        drop(current);

        self.announce(&snapshot);
        Ok(snapshot)
    }

    /// Generations are handed out under the write lock, so installed
    /// snapshots never go backwards.
    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// The session's builder, or one with the rules the backend reported
    /// for its latest scan.
    async fn current_builder(&self) -> GraphBuilder {
        match self.backend.relation_rules().await {
            Some(rules) => GraphBuilder::with_rules(rules),
            None => self.builder.clone(),
        }
    }

    fn announce(&self, snapshot: &SessionSnapshot) {
        info!(
            "Graph replaced: generation {} ({} nodes, {} edges)",
            snapshot.generation(),
            snapshot.graph().node_count(),
            snapshot.graph().edge_count()
        );
        let _ = self.events.send(SessionEvent::GraphReplaced {
            generation: snapshot.generation(),
            node_count: snapshot.graph().node_count(),
            edge_count: snapshot.graph().edge_count(),
        });
    }

    /// Text search against the current snapshot, off the async threads.
    pub async fn search(&self, query: &str) -> Result<Vec<Arc<GraphNode>>, SessionError> {
        let snapshot = self.snapshot().await;
        let query = query.to_string();
        let hits =
            tokio::task::spawn_blocking(move || snapshot.index().search_by_text(&query)).await?;
        Ok(hits)
    }

    /// Key usages from the loaded key lists only.
    pub async fn find_usages(&self, key: &str) -> Vec<ConfigSearchResult> {
        self.snapshot().await.index().find_usages(key)
    }

    /// Key usages enriched with line positions and values from each file's
    /// content.
    ///
    /// A file whose content cannot be fetched keeps its key-list usages.
    pub async fn find_usages_with_content(&self, key: &str) -> Vec<ConfigSearchResult> {
        let mut results = self.find_usages(key).await;

        for result in &mut results {
            match self.backend.get_file_content(&result.file).await {
                Ok(content) => enrich(result, &content),
                Err(e) => debug!("Usages for {} left unenriched: {}", result.file, e),
            }
        }

        results
    }

    /// Reads one file's content through the backend.
    pub async fn fetch_content(&self, path: &str) -> Result<String, ContentFetchError> {
        self.backend.get_file_content(path).await
    }
}

/// Replaces key-list usages with text positions and fills in the value.
///
/// Nested keys rarely appear verbatim in structured files, so the last
/// named segment is tried when the full key is not found.
fn enrich(result: &mut ConfigSearchResult, content: &str) {
    let mut located = locate_usages(content, &result.key, &result.file);
    if located.is_empty() {
        if let Some(leaf) = leaf_segment(&result.key) {
            located = locate_usages(content, leaf, &result.file);
        }
    }
    if !located.is_empty() {
        result.usages = located;
    }
    result.value = extract_value(content, &result.key);
}

/// Last named segment of a key; trailing `[n]` indices are skipped.
fn leaf_segment(key: &str) -> Option<&str> {
    let mut named = key;
    while let Some(stripped) = named.strip_suffix(']') {
        named = &stripped[..stripped.rfind('[')?];
    }
    let leaf = named.rsplit('.').next()?;
    (!leaf.is_empty() && leaf != key).then_some(leaf)
}
