//! Confgraph Core - Configuration source model
//!
//! This crate holds the types every other Confgraph crate speaks: the
//! scanned configuration file, environment declarations, usage locations,
//! and the error taxonomy of the configuration graph.
//!
//! It also knows how to pull declared keys out of a configuration file's
//! content (JSON, TOML, YAML, and TS/JS config modules) and how to locate
//! a key inside raw text.
//!
//! # Example
//!
//! ```
//! use confgraph_core::{extract_keys, ConfigSourceFile, FileType};
//!
//! let keys = extract_keys(r#"{"db": {"host": "localhost"}}"#, FileType::Json);
//! assert_eq!(keys, vec!["db", "db.host"]);
//!
//! let file = ConfigSourceFile::new("/app/config.json", FileType::Json).with_keys(keys);
//! assert_eq!(file.file_name(), "config.json");
//! ```

mod error;
pub mod extract;
mod source;
mod usage;

pub use error::{BuildError, ContentFetchError, ScanError};
pub use extract::extract_keys;
pub use source::{ConfigSourceFile, EnvironmentSpec, FileType, ScanResult};
pub use usage::{extract_value, locate_usages, ConfigSearchResult, UsageLocation};
