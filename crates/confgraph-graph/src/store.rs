//! Last-good scan persistence.
//!
//! Only the scan input is stored. The graph and its index are rebuilt from
//! it, which is cheap and deterministic, so a restarted session can show the
//! previous state before its first live scan finishes.
//!
//! Records carry a format number. A record written by an incompatible build
//! is treated as absent rather than as an error.

use confgraph_core::ScanResult;
use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

const SCAN_KEY: &[u8] = b"scan";
const FORMAT: u32 = 1;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sled(#[from] sled::Error),
    #[error("Serialization error: {0}")]
    Bincode(#[from] bincode::Error),
}

#[derive(Serialize, Deserialize)]
struct StoredScan {
    format: u32,
    scan: ScanResult,
}

/// Sled-backed holder of one `ScanResult`. Clones share the database.
#[derive(Clone)]
pub struct ScanStore {
    db: Db,
}

impl ScanStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Ok(Self {
            db: sled::open(path)?,
        })
    }

    /// Replaces the stored scan and flushes it to disk.
    pub fn save_scan(&self, scan: &ScanResult) -> Result<(), StoreError> {
        let record = StoredScan {
            format: FORMAT,
            scan: scan.clone(),
        };
        self.db.insert(SCAN_KEY, bincode::serialize(&record)?)?;
        self.db.flush()?;
        Ok(())
    }

    /// The stored scan, or `None` when nothing usable is stored.
    pub fn load_scan(&self) -> Result<Option<ScanResult>, StoreError> {
        let Some(bytes) = self.db.get(SCAN_KEY)? else {
            return Ok(None);
        };

        match bincode::deserialize::<StoredScan>(&bytes) {
            Ok(record) if record.format == FORMAT => Ok(Some(record.scan)),
            Ok(record) => {
                debug!("Ignoring stored scan in format {}", record.format);
                Ok(None)
            }
            Err(e) => {
                debug!("Ignoring unreadable stored scan: {}", e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confgraph_core::{ConfigSourceFile, EnvironmentSpec, FileType};
    use tempfile::tempdir;

    fn sample_scan() -> ScanResult {
        ScanResult::new(
            vec![ConfigSourceFile::new("/app/config.json", FileType::Json)
                .with_keys(["db.host"])
                .with_metadata(42, 1_700_000_000_000)],
            vec![EnvironmentSpec::new("prod", ["/app/config.json"]).with_label("Production")],
        )
    }

    #[test]
    fn test_save_load_scan() {
        let dir = tempdir().unwrap();
        let store = ScanStore::open(dir.path()).unwrap();
        assert!(store.load_scan().unwrap().is_none());

        store.save_scan(&sample_scan()).unwrap();
        assert_eq!(store.load_scan().unwrap(), Some(sample_scan()));

        let clone = store.clone();
        clone.save_scan(&ScanResult::default()).unwrap();
        assert_eq!(store.load_scan().unwrap(), Some(ScanResult::default()));
    }

    #[test]
    fn test_foreign_record_is_ignored() {
        let dir = tempdir().unwrap();
        let store = ScanStore::open(dir.path()).unwrap();

        let old = StoredScan {
            format: FORMAT + 1,
            scan: sample_scan(),
        };
        store
            .db
            .insert(SCAN_KEY, bincode::serialize(&old).unwrap())
            .unwrap();
        assert!(store.load_scan().unwrap().is_none());

        store.db.insert(SCAN_KEY, &b"garbage"[..]).unwrap();
        assert!(store.load_scan().unwrap().is_none());
    }
}
