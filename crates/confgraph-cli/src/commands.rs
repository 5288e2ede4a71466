//! CLI command implementations.

use colored::Colorize;
use confgraph_core::FileType;
use confgraph_graph::{ConfigGraph, FilterState, GraphBuilder, ScanStore};
use confgraph_scanner::{scan_directory, ProjectConfig, CONFIG_DIR};
use confgraph_session::{
    ConfigSession, ContentPreview, LocalBackend, NodeDetail, PresentationAdapter, SessionEvent,
    WatchConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Scan store directory inside `CONFIG_DIR`.
const STORE_DIR: &str = "store";

/// Lines of file content printed by `show`.
const PREVIEW_LINES: usize = 20;

/// Initialize Confgraph in a directory.
pub fn init(path: &Path) -> Result<()> {
    let config_path = ProjectConfig::path_for(path);

    if config_path.exists() {
        println!("{} Already initialized", "✓".green());
        return Ok(());
    }

    ProjectConfig::default().write(path)?;

    println!("{} Initialized Confgraph in {}", "✓".green(), path.display());
    println!("  Declare environments in {}", config_path.display().to_string().cyan());
    println!("  Run {} to build the graph", "confgraph scan".cyan());

    Ok(())
}

/// Scan a directory and build the configuration graph.
pub fn scan(path: &Path, output: Option<&Path>) -> Result<()> {
    println!("{}", "Scanning configuration...".cyan());

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message("Scanning files...");

    let config = ProjectConfig::load(path)?;
    let result = scan_directory(path, &config)?;

    spinner.set_message("Building graph...");
    let graph = GraphBuilder::with_rules(config.relation_rules())
        .build(&result.scan.sources, &result.scan.environments)?;

    spinner.finish_and_clear();

    let stats = graph.stats();
    println!(
        "{} Scanned {} files ({} keys) in {}ms",
        "✓".green(),
        result.files_scanned.to_string().cyan(),
        stats.keys.to_string().cyan(),
        result.duration_ms
    );
    println!(
        "  {} nodes, {} edges, {} environments",
        stats.node_count, stats.edge_count, stats.environments
    );

    if !result.skipped.is_empty() {
        println!("\n{} files could not be read:", "⚠".yellow());
        for (file, error) in result.skipped.iter().take(5) {
            println!("  {} - {}", file.red(), error);
        }
        if result.skipped.len() > 5 {
            println!("  ... and {} more", result.skipped.len() - 5);
        }
    }

    if let Some(store) = open_store(path)? {
        store.save_scan(&result.scan)?;
    }

    if let Some(out_path) = output {
        export_graph(&graph, out_path)?;
    }

    Ok(())
}

fn export_graph(graph: &ConfigGraph, path: &Path) -> Result<()> {
    let snapshot = graph.snapshot();

    let export = serde_json::json!({
        "version": "1.0",
        "stats": graph.stats(),
        "nodes": snapshot.nodes,
        "edges": snapshot.edges,
    });

    fs::write(path, serde_json::to_string_pretty(&export)?)?;
    println!("{} Exported to {}", "✓".green(), path.display());

    Ok(())
}

/// Search node labels and keys.
pub async fn search(path: &Path, text: &str, limit: usize) -> Result<()> {
    let session = open_session(path).await?;
    let hits = session.search(text).await?;

    if hits.is_empty() {
        println!("No matches found for \"{}\"", text);
        return Ok(());
    }

    println!("Found {} matches:\n", hits.len());

    let needle = text.to_lowercase();
    for node in hits.iter().take(limit) {
        println!(
            "  {} {} {}",
            node.variant().to_string().yellow(),
            node.label.cyan(),
            format!("({})", node.id).dimmed()
        );
        for key in node
            .keys()
            .iter()
            .filter(|k| k.to_lowercase().contains(&needle))
            .take(3)
        {
            println!("    {}", key.dimmed());
        }
    }

    if hits.len() > limit {
        println!("\n  ... and {} more", hits.len() - limit);
    }

    Ok(())
}

/// Show where a key is declared.
pub async fn usages(path: &Path, key: &str, with_content: bool) -> Result<()> {
    let session = open_session(path).await?;
    let results = if with_content {
        session.find_usages_with_content(key).await
    } else {
        session.find_usages(key).await
    };

    if results.is_empty() {
        println!("No usages of \"{}\"", key);
        return Ok(());
    }

    for result in &results {
        println!("{}", result.file.cyan());
        if let Some(value) = &result.value {
            println!("  {} {}", "value:".dimmed(), value);
        }
        for usage in &result.usages {
            let position = match (usage.line, usage.column) {
                (Some(line), Some(column)) => format!("{}:{}", line, column),
                (Some(line), None) => line.to_string(),
                _ => "-".to_string(),
            };
            println!("  {} {}", position.yellow(), usage.context);
        }
    }

    Ok(())
}

/// Show one node.
pub async fn show(path: &Path, node_id: &str) -> Result<()> {
    let adapter = PresentationAdapter::new(open_session(path).await?);
    let detail = adapter
        .on_node_selected(node_id)
        .await
        .ok_or_else(|| format!("No node with id '{}'", node_id))?;

    match detail {
        NodeDetail::File {
            label,
            path,
            file_type,
            size_bytes,
            modified_at_epoch_ms,
            keys,
            environments,
            content,
            ..
        } => {
            println!("{}", label.cyan().bold());
            println!();
            println!("  {} {}", "Path:".dimmed(), path);
            println!("  {} {}", "Type:".dimmed(), file_type.display_name());
            println!("  {} {} bytes", "Size:".dimmed(), size_bytes);
            println!("  {} {}", "Modified:".dimmed(), format_time(modified_at_epoch_ms));
            if environments.is_empty() {
                println!("  {} none", "Environments:".dimmed());
            } else {
                println!("  {} {}", "Environments:".dimmed(), environments.join(", "));
            }

            println!("  {} ({})", "Keys:".dimmed(), keys.len());
            for key in &keys {
                println!("    {}", key);
            }

            println!();
            match content {
                ContentPreview::Loaded(text) => {
                    let total = text.lines().count();
                    for line in text.lines().take(PREVIEW_LINES) {
                        println!("  {} {}", "│".dimmed(), line);
                    }
                    if total > PREVIEW_LINES {
                        println!("  ... ({} more lines)", total - PREVIEW_LINES);
                    }
                }
                ContentPreview::Unavailable(reason) => {
                    println!("  {}", reason.red());
                }
            }
        }
        NodeDetail::Environment {
            label,
            description,
            members,
            ..
        } => {
            println!("{}", label.green().bold());
            if let Some(description) = description {
                println!("  {}", description.dimmed());
            }
            println!();
            println!("  {} ({})", "Members:".dimmed(), members.len());
            for member in &members {
                println!("    {}", member);
            }
        }
        NodeDetail::Module { label, .. } => {
            println!("{}", label.yellow().bold());
        }
    }

    Ok(())
}

/// Visibility options for `visual`.
pub struct VisualOptions {
    pub show_files: bool,
    pub show_environments: bool,
    pub show_modules: bool,
    /// Empty means every file type.
    pub types: Vec<FileType>,
}

impl VisualOptions {
    fn filter(&self) -> FilterState {
        let filter = FilterState::all()
            .with_files(self.show_files)
            .with_environments(self.show_environments)
            .with_modules(self.show_modules);

        if self.types.is_empty() {
            filter
        } else {
            filter.with_file_types(self.types.iter().copied())
        }
    }
}

/// Export visual records for the filtered graph.
pub async fn visual(path: &Path, options: VisualOptions, output: Option<&Path>) -> Result<()> {
    let mut adapter = PresentationAdapter::new(open_session(path).await?);
    adapter.set_filter(options.filter());

    let visual = adapter.visual().await;
    let json = serde_json::to_string_pretty(&visual)?;

    match output {
        Some(out_path) => {
            fs::write(out_path, json)?;
            println!(
                "{} Wrote {} nodes and {} edges to {}",
                "✓".green(),
                visual.nodes.len(),
                visual.edges.len(),
                out_path.display()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}

/// Watch the project and re-scan on changes.
pub async fn watch(path: &Path, debounce_ms: u64) -> Result<()> {
    let backend = LocalBackend::open(path)?;
    let watch_config = WatchConfig::new(path, &backend.config().await)
        .with_debounce(Duration::from_millis(debounce_ms));
    let session = Arc::new(build_session(backend)?);

    let mut events = session.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    if session.seed_from_store().await? {
        println!("{} Loaded last good scan", "✓".green());
    }
    // A failed first scan is reported through the event stream.
    let _ = session.refresh().await;

    println!("Watching {}", path.display().to_string().cyan());
    println!("  Press {} to stop", "Ctrl+C".cyan());

    tokio::select! {
        result = confgraph_session::watch(session.clone(), watch_config) => result?,
        _ = tokio::signal::ctrl_c() => println!("\n{} Stopped", "✓".green()),
    }

    Ok(())
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::GraphReplaced {
            generation,
            node_count,
            edge_count,
        } => println!(
            "{} Graph updated: {} nodes, {} edges {}",
            "✓".green(),
            node_count,
            edge_count,
            format!("(#{})", generation).dimmed()
        ),
        SessionEvent::RefreshFailed { message } => println!(
            "{} Refresh failed, keeping last good graph: {}",
            "⚠".yellow(),
            message
        ),
        SessionEvent::RefreshSkipped => {
            println!("{}", "Refresh already running, skipped".dimmed())
        }
    }
}

/// A session over the local project, with last-good persistence once the
/// project is initialized. Relation rules follow the project config as of
/// each scan.
fn build_session(backend: LocalBackend) -> Result<ConfigSession> {
    let store = open_store(backend.root())?;

    let mut session = ConfigSession::new(Arc::new(backend), GraphBuilder::new());
    if let Some(store) = store {
        session = session.with_store(store);
    }
    Ok(session)
}

async fn open_session(path: &Path) -> Result<Arc<ConfigSession>> {
    let session = build_session(LocalBackend::open(path)?)?;
    session.refresh().await?;
    Ok(Arc::new(session))
}

fn open_store(path: &Path) -> Result<Option<ScanStore>> {
    let dir = path.join(CONFIG_DIR);
    if !dir.is_dir() {
        return Ok(None);
    }
    let store_path = dir.join(STORE_DIR);
    debug!("Using scan store at {}", store_path.display());
    Ok(Some(ScanStore::open(store_path)?))
}

fn format_time(epoch_ms: u64) -> String {
    if epoch_ms == 0 {
        return "unknown".to_string();
    }
    chrono::DateTime::<chrono::Utc>::from_timestamp_millis(epoch_ms as i64)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
