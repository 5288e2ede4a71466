//! Project configuration.
//!
//! Settings live in `<root>/.confgraph/config.json`. When a project has no
//! file, the user-level `<config dir>/confgraph/config.json` is used, and
//! failing that the defaults.

use confgraph_core::{EnvironmentSpec, ScanError};
use confgraph_graph::RelationRule;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Directory holding per-project state.
pub const CONFIG_DIR: &str = ".confgraph";
/// Settings file inside `CONFIG_DIR`.
pub const CONFIG_FILE: &str = "config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<ConfigError> for ScanError {
    fn from(err: ConfigError) -> Self {
        ScanError::Config(err.to_string())
    }
}

/// Scan and graph settings for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectConfig {
    pub version: String,
    /// Deepest directory level walked below the root.
    pub max_depth: usize,
    /// Directory names never walked.
    pub ignore: Vec<String>,
    /// Dot-directories that are walked anyway.
    pub allow_hidden: Vec<String>,
    /// Honour `.gitignore` and `.ignore` files.
    pub respect_gitignore: bool,
    /// Environments; member paths are relative to the project root.
    pub environments: Vec<EnvironmentSpec>,
    /// Relation rules. `None` means the built-in defaults.
    pub relations: Option<Vec<RelationRule>>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            max_depth: 4,
            ignore: ["node_modules", "target", "dist", ".git"]
                .into_iter()
                .map(String::from)
                .collect(),
            allow_hidden: [".github", ".vscode"]
                .into_iter()
                .map(String::from)
                .collect(),
            respect_gitignore: true,
            environments: Vec::new(),
            relations: None,
        }
    }
}

impl ProjectConfig {
    /// Location of the project config file under `root`.
    pub fn path_for(root: &Path) -> PathBuf {
        root.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Location of the user-level fallback, if the platform has one.
    pub fn user_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("confgraph").join(CONFIG_FILE))
    }

    /// Loads the project config, falling back to the user config and then
    /// to defaults.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let project = Self::path_for(root);
        if project.exists() {
            return Self::load_file(&project);
        }

        if let Some(user) = Self::user_path().filter(|p| p.exists()) {
            debug!("Using user config {}", user.display());
            return Self::load_file(&user);
        }

        Ok(Self::default())
    }

    /// Loads one config file.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes this config under `root`, creating the config directory.
    pub fn write(&self, root: &Path) -> Result<PathBuf, ConfigError> {
        let path = Self::path_for(root);
        let io_err = |source| ConfigError::Io {
            path: path.clone(),
            source,
        };

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let text = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, text).map_err(io_err)?;

        Ok(path)
    }

    /// Environments with member paths made absolute against `root`.
    pub fn resolved_environments(&self, root: &Path) -> Vec<EnvironmentSpec> {
        self.environments
            .iter()
            .map(|env| EnvironmentSpec {
                member_paths: env
                    .member_paths
                    .iter()
                    .map(|member| normalize(&root.join(member)).to_string_lossy().to_string())
                    .collect(),
                ..env.clone()
            })
            .collect()
    }

    /// The relation rules to build with.
    pub fn relation_rules(&self) -> Vec<RelationRule> {
        self.relations.clone().unwrap_or_else(RelationRule::defaults)
    }
}

/// Drops `.` components and folds `..` into its parent without touching
/// the filesystem, so member paths compare equal to scanned paths.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ProjectConfig = serde_json::from_str(r#"{"maxDepth": 2}"#).unwrap();
        assert_eq!(config.max_depth, 2);
        assert_eq!(config.ignore, ProjectConfig::default().ignore);
        assert!(config.relations.is_none());
    }

    #[test]
    fn test_write_and_load() {
        let dir = tempdir().unwrap();
        let mut config = ProjectConfig::default();
        config.environments.push(EnvironmentSpec::new("prod", ["config/prod.json"]));

        let path = config.write(dir.path()).unwrap();
        assert!(path.ends_with(".confgraph/config.json"));

        let loaded = ProjectConfig::load(dir.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = ProjectConfig::path_for(dir.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ nope").unwrap();

        let err = ProjectConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        let scan_err: ScanError = err.into();
        assert!(matches!(scan_err, ScanError::Config(_)));
    }

    #[test]
    fn test_resolved_environments() {
        let mut config = ProjectConfig::default();
        config.environments.push(
            EnvironmentSpec::new("prod", ["config/prod.json"]).with_label("Production"),
        );

        let resolved = config.resolved_environments(Path::new("/srv/app"));
        assert_eq!(resolved[0].member_paths, vec!["/srv/app/config/prod.json"]);
        assert_eq!(resolved[0].label.as_deref(), Some("Production"));
    }

    #[test]
    fn test_resolved_environments_normalizes_members() {
        let mut config = ProjectConfig::default();
        config.environments.push(EnvironmentSpec::new(
            "prod",
            ["./prod.json", "config/../shared/base.json", "./deploy/./prod.yaml"],
        ));

        let resolved = config.resolved_environments(Path::new("/srv/app"));
        assert_eq!(
            resolved[0].member_paths,
            vec![
                "/srv/app/prod.json",
                "/srv/app/shared/base.json",
                "/srv/app/deploy/prod.yaml"
            ]
        );
    }

    #[test]
    fn test_relation_rules_default() {
        assert_eq!(
            ProjectConfig::default().relation_rules(),
            RelationRule::defaults()
        );

        let config: ProjectConfig = serde_json::from_str(
            r#"{"relations": [{"from": "a.json", "to": "b.json", "kind": "extends"}]}"#,
        )
        .unwrap();
        let rules = config.relation_rules();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].kind, confgraph_graph::EdgeKind::Extends);
    }
}
