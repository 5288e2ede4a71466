//! Filesystem watching with debounced refresh.
//!
//! Change events for configuration files are collapsed until the tree has
//! been quiet for the debounce interval, then one refresh is requested.
//! A refresh that is still running when the next burst settles makes the
//! new request a no-op, per the session's refresh discipline.

use crate::session::{ConfigSession, RefreshOutcome};
use confgraph_core::FileType;
use confgraph_scanner::{ProjectConfig, CONFIG_DIR, CONFIG_FILE};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Settings for `watch`.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Root directory to watch recursively.
    pub root: PathBuf,
    /// Quiet period before a refresh is triggered.
    pub debounce: Duration,
    /// Directory names whose contents are ignored.
    pub ignore: Vec<String>,
    /// Dot-directories whose contents still count.
    pub allow_hidden: Vec<String>,
}

impl WatchConfig {
    pub fn new(root: impl Into<PathBuf>, project: &ProjectConfig) -> Self {
        Self {
            root: root.into(),
            debounce: Duration::from_millis(300),
            ignore: project.ignore.clone(),
            allow_hidden: project.allow_hidden.clone(),
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Whether a change at `path` should trigger a refresh.
    ///
    /// The project config file counts too, since it declares environments
    /// and relations.
    pub fn is_relevant(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        if relative == Path::new(CONFIG_DIR).join(CONFIG_FILE) {
            return true;
        }
        if FileType::from_path(path) == FileType::Other {
            return false;
        }

        let mut parents = relative.components().collect::<Vec<_>>();
        parents.pop();

        parents.iter().all(|component| match component {
            Component::Normal(name) => {
                let name = name.to_string_lossy();
                let ignored = self.ignore.iter().any(|n| *n == name);
                let hidden =
                    name.starts_with('.') && !self.allow_hidden.iter().any(|n| *n == name);
                !ignored && !hidden
            }
            _ => true,
        })
    }
}

/// Watches `config.root` and refreshes `session` after each settled burst
/// of relevant changes. Runs until the task is dropped.
pub async fn watch(session: Arc<ConfigSession>, config: WatchConfig) -> notify::Result<()> {
    let root = std::fs::canonicalize(&config.root).map_err(notify::Error::io)?;
    let config = WatchConfig { root, ..config };
    let (notify_tx, mut notify_rx) = mpsc::channel::<notify::Result<Event>>(256);

    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = notify_tx.blocking_send(res);
        },
        Config::default(),
    )?;
    watcher.watch(&config.root, RecursiveMode::Recursive)?;
    info!("Watching {} for configuration changes", config.root.display());

    let mut pending: Option<Instant> = None;
    let mut changed: Vec<PathBuf> = Vec::new();

    loop {
        if let Some(since) = pending {
            if since.elapsed() >= config.debounce {
                pending = None;
                debug!("{} changed paths settled", changed.len());
                changed.clear();

                match session.refresh().await {
                    Ok(RefreshOutcome::Replaced(snapshot)) => info!(
                        "Refreshed: {} nodes, {} edges",
                        snapshot.graph().node_count(),
                        snapshot.graph().edge_count()
                    ),
                    Ok(RefreshOutcome::Skipped) => debug!("Refresh skipped"),
                    Err(e) => warn!("Refresh failed: {}", e),
                }
            }
        }

        match tokio::time::timeout(Duration::from_millis(50), notify_rx.recv()).await {
            Ok(Some(Ok(event))) => {
                for path in event.paths {
                    if config.is_relevant(&path) {
                        pending = Some(Instant::now());
                        changed.push(path);
                    }
                }
            }
            Ok(Some(Err(e))) => {
                warn!("Watch error: {}", e);
            }
            Ok(None) => break,
            Err(_) => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WatchConfig {
        WatchConfig::new("/srv/app", &ProjectConfig::default())
    }

    #[test]
    fn test_is_relevant() {
        let config = config();

        assert!(config.is_relevant(Path::new("/srv/app/config.json")));
        assert!(config.is_relevant(Path::new("/srv/app/web/vite.config.ts")));
        assert!(config.is_relevant(Path::new("/srv/app/.github/workflows/ci.yml")));

        assert!(!config.is_relevant(Path::new("/srv/app/README.md")));
        assert!(!config.is_relevant(Path::new("/srv/app/node_modules/x/package.json")));
        assert!(!config.is_relevant(Path::new("/srv/app/.confgraph/notes.json")));
        assert!(!config.is_relevant(Path::new("/srv/app/.cache/state.json")));
    }

    #[test]
    fn test_project_config_is_relevant() {
        let config = config();
        assert!(config.is_relevant(Path::new("/srv/app/.confgraph/config.json")));
        assert!(!config.is_relevant(Path::new("/srv/app/web/.confgraph/config.json")));
    }

    #[test]
    fn test_hidden_files_are_relevant() {
        assert!(config().is_relevant(Path::new("/srv/app/.eslintrc.json")));
    }
}
