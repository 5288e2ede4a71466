//! Confgraph Scanner - Local configuration discovery
//!
//! This crate finds configuration files under a project root, extracts
//! their keys, and loads the project settings that control the walk and the
//! graph: ignore lists, depth, declared environments and relation rules.

mod config;
mod scan;

pub use config::{ConfigError, ProjectConfig, CONFIG_DIR, CONFIG_FILE};
pub use scan::{read_content, scan_directory, scan_file, ScanOutput};
