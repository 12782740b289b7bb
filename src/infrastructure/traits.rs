//! I/O boundary traits for testability
//!
//! The node store abstracts the persistence engine, allowing services
//! to be tested with an in-memory implementation.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use crate::domain::NodeRecord;

/// Persistence engine for node rows.
///
/// `commit` replaces the stored rows as one unit: after it returns either
/// all rows are durable or the previous state is untouched.
pub trait NodeStore: Send + Sync {
    /// Read all committed rows. An uninitialized store has none.
    fn fetch(&self) -> io::Result<Vec<NodeRecord>>;

    /// Atomically replace the committed rows.
    fn commit(&self, records: &[NodeRecord]) -> io::Result<()>;
}

const STORE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    version: u32,
    nodes: Vec<NodeRecord>,
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Node rows kept as a JSON document on disk.
#[derive(Debug, Clone)]
pub struct FileNodeStore {
    path: PathBuf,
}

impl FileNodeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NodeStore for FileNodeStore {
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    fn fetch(&self) -> io::Result<Vec<NodeRecord>> {
        if !self.path.exists() {
            debug!("no store file yet");
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        let document: StoreDocument = serde_json::from_str(&content)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if document.version != STORE_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unsupported store version {}", document.version),
            ));
        }
        Ok(document.nodes)
    }

    /// Write to a temp file next to the target, then rename over it.
    #[instrument(level = "debug", skip(self, records), fields(path = %self.path.display()))]
    fn commit(&self, records: &[NodeRecord]) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let document = StoreDocument {
            version: STORE_VERSION,
            nodes: records.to_vec(),
        };
        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, &document)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        debug!("committed {} records", records.len());
        Ok(())
    }
}

/// Rows held in memory; for tests and throwaway trees.
#[derive(Debug, Default)]
pub struct MemoryNodeStore {
    records: Mutex<Vec<NodeRecord>>,
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<NodeRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

impl NodeStore for MemoryNodeStore {
    fn fetch(&self) -> io::Result<Vec<NodeRecord>> {
        let records = self
            .records
            .lock()
            .map_err(|_| io::Error::other("node store lock poisoned"))?;
        Ok(records.clone())
    }

    fn commit(&self, records: &[NodeRecord]) -> io::Result<()> {
        let mut stored = self
            .records
            .lock()
            .map_err(|_| io::Error::other("node store lock poisoned"))?;
        *stored = records.to_vec();
        Ok(())
    }
}
