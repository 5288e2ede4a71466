//! The external data path: scanning and file content.

use async_trait::async_trait;
use confgraph_core::{ContentFetchError, ScanError, ScanResult};
use confgraph_graph::RelationRule;
use confgraph_scanner::{read_content, scan_directory, ConfigError, ProjectConfig};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Collaborator that produces scans and file content.
///
/// Each call is a single request/response. Retries are the caller's
/// business.
#[async_trait]
pub trait ConfigBackend: Send + Sync {
    /// Scans every configuration source and the declared environments.
    async fn scan_configs(&self) -> Result<ScanResult, ScanError>;

    /// Reads the text of one file.
    async fn get_file_content(&self, path: &str) -> Result<String, ContentFetchError>;

    /// Relation rules in effect as of the latest scan. `None` keeps the
    /// session's own builder rules.
    async fn relation_rules(&self) -> Option<Vec<RelationRule>> {
        None
    }
}

/// Backend reading the local filesystem under one project root.
///
/// A backend made with `open` re-reads the project config on every scan,
/// so edited environments and relations take effect on the next refresh.
/// One made with `new` keeps the config it was given.
#[derive(Debug)]
pub struct LocalBackend {
    root: PathBuf,
    config: RwLock<ProjectConfig>,
    reload: bool,
}

impl LocalBackend {
    pub fn new(root: impl Into<PathBuf>, config: ProjectConfig) -> Self {
        Self {
            root: root.into(),
            config: RwLock::new(config),
            reload: false,
        }
    }

    /// Creates a backend with the project's configuration loaded from disk.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let root = root.into();
        let config = ProjectConfig::load(&root)?;
        Ok(Self {
            root,
            config: RwLock::new(config),
            reload: true,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The config used by the latest scan.
    pub async fn config(&self) -> ProjectConfig {
        self.config.read().await.clone()
    }
}

#[async_trait]
impl ConfigBackend for LocalBackend {
    async fn scan_configs(&self) -> Result<ScanResult, ScanError> {
        let root = self.root.clone();
        let cached = self.config.read().await.clone();
        let reload = self.reload;

        let (config, output) = tokio::task::spawn_blocking(move || {
            let config = if reload {
                ProjectConfig::load(&root)?
            } else {
                cached
            };
            let output = scan_directory(&root, &config)?;
            Ok::<_, ScanError>((config, output))
        })
        .await
        .map_err(|e| ScanError::Backend(e.to_string()))??;

        info!(
            "Scanned {} files in {}ms ({} skipped)",
            output.files_scanned,
            output.duration_ms,
            output.skipped.len()
        );

        let mut current = self.config.write().await;
        if *current != config {
            debug!("Project config changed since the last scan");
            *current = config;
        }
        Ok(output.scan)
    }

    async fn get_file_content(&self, path: &str) -> Result<String, ContentFetchError> {
        let path = PathBuf::from(path);
        tokio::task::spawn_blocking(move || read_content(&path))
            .await
            .map_err(|e| ContentFetchError::Backend(e.to_string()))?
    }

    async fn relation_rules(&self) -> Option<Vec<RelationRule>> {
        Some(self.config.read().await.relation_rules())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_local_backend_scan_and_read() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("config.json");
        fs::write(&file, r#"{"db": {"port": 5432}}"#).unwrap();

        let backend = LocalBackend::open(dir.path()).unwrap();
        let scan = backend.scan_configs().await.unwrap();
        assert_eq!(scan.sources.len(), 1);
        assert_eq!(scan.sources[0].keys, vec!["db", "db.port"]);

        let content = backend
            .get_file_content(&scan.sources[0].path)
            .await
            .unwrap();
        assert!(content.contains("5432"));
    }

    #[tokio::test]
    async fn test_local_backend_missing_file() {
        let dir = tempdir().unwrap();
        let backend = LocalBackend::new(dir.path(), ProjectConfig::default());
        let missing = dir.path().join("gone.json");

        let err = backend
            .get_file_content(&missing.to_string_lossy())
            .await
            .unwrap_err();
        assert!(matches!(err, ContentFetchError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_open_backend_reloads_config_on_scan() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("prod.json"), "{}").unwrap();

        let backend = LocalBackend::open(dir.path()).unwrap();
        let scan = backend.scan_configs().await.unwrap();
        assert!(scan.environments.is_empty());

        let mut config = ProjectConfig::default();
        config
            .environments
            .push(confgraph_core::EnvironmentSpec::new("prod", ["prod.json"]));
        config.relations = Some(Vec::new());
        config.write(dir.path()).unwrap();

        let scan = backend.scan_configs().await.unwrap();
        assert_eq!(scan.environments.len(), 1);
        assert_eq!(backend.config().await, config);
        assert_eq!(backend.relation_rules().await, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_invalid_config_fails_scan() {
        let dir = tempdir().unwrap();
        let backend = LocalBackend::open(dir.path()).unwrap();

        let path = ProjectConfig::path_for(dir.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ nope").unwrap();

        let err = backend.scan_configs().await.unwrap_err();
        assert!(matches!(err, ScanError::Config(_)));
    }
}
