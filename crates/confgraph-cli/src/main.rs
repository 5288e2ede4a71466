//! Confgraph CLI - Command-line interface for Confgraph
//!
//! This is the main entry point for users interacting with the
//! configuration graph. It provides commands for scanning a project,
//! querying keys and nodes, exporting visual records, and watching.

use clap::{Parser, Subcommand};
use colored::Colorize;
use confgraph_core::FileType;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "confgraph")]
#[command(author = "Confgraph Contributors")]
#[command(version)]
#[command(about = "Map configuration files, environments and keys as a graph", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .confgraph/config.json with default settings
    Init {
        /// Project root (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Scan the project and build the graph
    Scan {
        /// Project root (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Write the graph as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Search node labels and configuration keys
    Search {
        /// Search text (case-insensitive substring)
        text: String,

        /// Maximum results to print
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Project root
        #[arg(short, long, default_value = ".")]
        path: PathBuf,
    },

    /// Find where a key is declared
    Usages {
        /// The dotted key, e.g. db.host
        key: String,

        /// Read each file for line positions and values
        #[arg(long)]
        content: bool,

        /// Project root
        #[arg(short, long, default_value = ".")]
        path: PathBuf,
    },

    /// Show one node and its detail
    Show {
        /// Node id, e.g. env:prod or file:/abs/path/config.json
        node_id: String,

        /// Project root
        #[arg(short, long, default_value = ".")]
        path: PathBuf,
    },

    /// Export visual node and edge records
    Visual {
        /// Hide file nodes
        #[arg(long)]
        no_files: bool,

        /// Hide environment nodes
        #[arg(long)]
        no_environments: bool,

        /// Hide module nodes
        #[arg(long)]
        no_modules: bool,

        /// Only show files of these types (repeatable)
        #[arg(long = "type", value_name = "TYPE")]
        types: Vec<FileType>,

        /// Write JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Project root
        #[arg(short, long, default_value = ".")]
        path: PathBuf,
    },

    /// Re-scan whenever configuration files change
    Watch {
        /// Project root (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Quiet period before re-scanning, in milliseconds
        #[arg(long, default_value = "300")]
        debounce_ms: u64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let result = match cli.command {
        Commands::Init { path } => commands::init(&path),
        Commands::Scan { path, output } => commands::scan(&path, output.as_deref()),
        Commands::Search { text, limit, path } => commands::search(&path, &text, limit).await,
        Commands::Usages { key, content, path } => commands::usages(&path, &key, content).await,
        Commands::Show { node_id, path } => commands::show(&path, &node_id).await,
        Commands::Visual {
            no_files,
            no_environments,
            no_modules,
            types,
            output,
            path,
        } => {
            let options = commands::VisualOptions {
                show_files: !no_files,
                show_environments: !no_environments,
                show_modules: !no_modules,
                types,
            };
            commands::visual(&path, options, output.as_deref()).await
        }
        Commands::Watch { path, debounce_ms } => commands::watch(&path, debounce_ms).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
