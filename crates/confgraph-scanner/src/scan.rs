//! Local directory scanning.
//!
//! Walks a project root, keeps files with a known configuration extension,
//! and extracts their keys. Unreadable entries are reported and skipped;
//! only an unusable root fails the scan.

use crate::config::ProjectConfig;
use confgraph_core::{
    extract_keys, ConfigSourceFile, ContentFetchError, FileType, ScanError, ScanResult,
};
use ignore::{DirEntry, WalkBuilder};
use std::fs;
use std::io;
use std::path::Path;
use std::time::{Instant, UNIX_EPOCH};
use tracing::{debug, warn};

/// Result of scanning a directory.
#[derive(Debug)]
pub struct ScanOutput {
    /// Scanned files plus the configured environments.
    pub scan: ScanResult,
    /// Number of configuration files found.
    pub files_scanned: usize,
    /// Entries that could not be read, with the reason.
    pub skipped: Vec<(String, String)>,
    /// Time taken in milliseconds.
    pub duration_ms: u64,
}

/// Scans `root` according to `config`.
///
/// Source paths are absolute and sorted. Environment member paths from the
/// config are resolved against the canonical root.
pub fn scan_directory(root: &Path, config: &ProjectConfig) -> Result<ScanOutput, ScanError> {
    let start = Instant::now();
    let root = fs::canonicalize(root).map_err(|e| ScanError::io(root.display().to_string(), e))?;
    if !root.is_dir() {
        return Err(ScanError::Io {
            path: root.display().to_string(),
            message: "not a directory".to_string(),
        });
    }

    let ignore_names = config.ignore.clone();
    let allow_hidden = config.allow_hidden.clone();

    let walker = WalkBuilder::new(&root)
        .hidden(false)
        .git_ignore(config.respect_gitignore)
        .git_exclude(config.respect_gitignore)
        .git_global(false)
        .ignore(config.respect_gitignore)
        .require_git(false)
        .max_depth(Some(config.max_depth + 1))
        .filter_entry(move |entry| keep_entry(entry, &ignore_names, &allow_hidden))
        .build();

    let mut sources = Vec::new();
    let mut skipped = Vec::new();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                skipped.push((root.display().to_string(), e.to_string()));
                continue;
            }
        };

        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }

        match scan_file(entry.path()) {
            Ok(Some(source)) => sources.push(source),
            Ok(None) => {}
            Err(e) => {
                warn!("Failed to read {}: {}", entry.path().display(), e);
                skipped.push((entry.path().display().to_string(), e.to_string()));
            }
        }
    }

    sources.sort_by(|a, b| a.path.cmp(&b.path));
    let files_scanned = sources.len();
    let environments = config.resolved_environments(&root);

    debug!(
        "Scanned {} config files under {} ({} skipped)",
        files_scanned,
        root.display(),
        skipped.len()
    );

    Ok(ScanOutput {
        scan: ScanResult::new(sources, environments),
        files_scanned,
        skipped,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Directory filter: skips ignored names and dot-directories that are not
/// allow-listed. Files always pass.
fn keep_entry(entry: &DirEntry, ignore_names: &[String], allow_hidden: &[String]) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
        return true;
    }

    let name = entry.file_name().to_string_lossy();
    if ignore_names.iter().any(|n| *n == name) {
        return false;
    }
    if name.starts_with('.') && !allow_hidden.iter().any(|n| *n == name) {
        return false;
    }
    true
}

/// Reads one file into a source record.
///
/// Returns `Ok(None)` for files without a configuration extension.
pub fn scan_file(path: &Path) -> io::Result<Option<ConfigSourceFile>> {
    let file_type = FileType::from_path(path);
    if file_type == FileType::Other {
        return Ok(None);
    }

    let metadata = fs::metadata(path)?;
    let modified = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    let bytes = fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);
    let keys = extract_keys(&content, file_type);

    Ok(Some(
        ConfigSourceFile::new(path.to_string_lossy(), file_type)
            .with_metadata(metadata.len(), modified)
            .with_keys(keys),
    ))
}

/// Reads a file's text for preview.
pub fn read_content(path: &Path) -> Result<String, ContentFetchError> {
    let display = path.display().to_string();
    let bytes = fs::read(path).map_err(|e| ContentFetchError::io(&display, e))?;
    String::from_utf8(bytes).map_err(|_| ContentFetchError::Unreadable {
        path: display,
        reason: "content is not valid UTF-8".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use confgraph_core::EnvironmentSpec;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn scanned_names(output: &ScanOutput, root: &Path) -> Vec<String> {
        output
            .scan
            .sources
            .iter()
            .map(|s| {
                Path::new(&s.path)
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_scan_directory_filters_entries() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "config.json", r#"{"db": {"host": "localhost"}}"#);
        write(root, "vite.config.ts", "export default { server: { port: 3000 } }\n");
        write(root, "README.md", "# readme");
        write(root, "node_modules/pkg/package.json", "{}");
        write(root, ".cache/settings.json", "{}");
        write(root, ".github/workflows/ci.yml", "jobs:\n  build: {}\n");

        let output = scan_directory(root, &ProjectConfig::default()).unwrap();
        let canonical = fs::canonicalize(root).unwrap();
        let names = scanned_names(&output, &canonical);

        assert_eq!(
            names,
            vec![".github/workflows/ci.yml", "config.json", "vite.config.ts"]
        );
        assert_eq!(output.files_scanned, 3);

        let config = &output.scan.sources[1];
        assert_eq!(config.file_type, FileType::Json);
        assert_eq!(config.keys, vec!["db", "db.host"]);
        assert!(config.size_bytes > 0);
    }

    #[test]
    fn test_scan_respects_max_depth() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a/b/c/deep.json", "{}");
        write(dir.path(), "a/shallow.json", "{}");

        let config = ProjectConfig {
            max_depth: 1,
            ..ProjectConfig::default()
        };
        let output = scan_directory(dir.path(), &config).unwrap();
        let canonical = fs::canonicalize(dir.path()).unwrap();
        assert_eq!(scanned_names(&output, &canonical), vec!["a/shallow.json"]);
    }

    #[test]
    fn test_environments_are_resolved_against_root() {
        let dir = tempdir().unwrap();
        write(dir.path(), "prod.json", "{}");

        let config = ProjectConfig {
            environments: vec![EnvironmentSpec::new("prod", ["prod.json"])],
            ..ProjectConfig::default()
        };
        let output = scan_directory(dir.path(), &config).unwrap();

        let member = &output.scan.environments[0].member_paths[0];
        assert_eq!(member, &output.scan.sources[0].path);
    }

    #[test]
    fn test_dot_relative_member_matches_scanned_file() {
        let dir = tempdir().unwrap();
        write(dir.path(), "prod.json", "{}");

        let config = ProjectConfig {
            environments: vec![EnvironmentSpec::new("prod", ["./prod.json"])],
            ..ProjectConfig::default()
        };
        let output = scan_directory(dir.path(), &config).unwrap();

        let member = &output.scan.environments[0].member_paths[0];
        assert_eq!(member, &output.scan.sources[0].path);

        let graph = confgraph_graph::GraphBuilder::new()
            .build(&output.scan.sources, &output.scan.environments)
            .unwrap();
        assert_eq!(graph.stats().environments, 1);
    }

    #[test]
    fn test_missing_root_fails() {
        let dir = tempdir().unwrap();
        let err = scan_directory(&dir.path().join("nope"), &ProjectConfig::default()).unwrap_err();
        assert!(matches!(err, ScanError::Io { .. }));
    }

    #[test]
    fn test_read_content_errors() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            read_content(&missing),
            Err(ContentFetchError::NotFound(_))
        ));

        let binary = dir.path().join("blob.json");
        fs::write(&binary, [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(
            read_content(&binary),
            Err(ContentFetchError::Unreadable { .. })
        ));

        let ok = dir.path().join("ok.json");
        fs::write(&ok, "{}").unwrap();
        assert_eq!(read_content(&ok).unwrap(), "{}");
    }
}
