//! Confgraph Session - The owned state behind a visual surface
//!
//! A session is created on connect and dropped on disconnect. It holds the
//! current graph snapshot and its search index, replaces both wholesale on
//! refresh, and broadcasts what happened to subscribers.
//!
//! The session supports:
//! - One refresh at a time; overlapping requests are ignored
//! - Stale-but-valid display when a scan or build fails
//! - Last-good scan persistence for a quick start
//! - Debounced refresh on filesystem changes

mod adapter;
mod backend;
mod session;
pub mod watch;

pub use adapter::{ContentPreview, NodeDetail, PresentationAdapter};
pub use backend::{ConfigBackend, LocalBackend};
pub use session::{ConfigSession, RefreshOutcome, SessionError, SessionEvent, SessionSnapshot};
pub use watch::{watch, WatchConfig};
