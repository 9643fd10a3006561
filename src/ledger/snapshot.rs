//! JSON snapshots of the chain for persistence and debugging

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::types::*;

/// Ordered copy of the chain, `{length, chain}` on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub length: usize,
    pub chain: Vec<Block>,
}

impl ChainSnapshot {
    pub fn new(chain: Vec<Block>) -> Self {
        Self {
            length: chain.len(),
            chain,
        }
    }

    /// Write the snapshot as pretty-printed JSON, creating parent directories
    ///
    /// Each save stages into its own temporary file next to `path` and renames
    /// it into place, so readers only ever see a complete snapshot.
    pub fn save(&self, path: &Path) -> LedgerResult<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| {
            LedgerError::Snapshot(format!("Failed to create {}: {}", dir.display(), e))
        })?;

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| LedgerError::Snapshot(format!("Failed to serialize chain: {}", e)))?;

        let mut staging = NamedTempFile::new_in(dir).map_err(|e| {
            LedgerError::Snapshot(format!("Failed to stage in {}: {}", dir.display(), e))
        })?;
        staging.write_all(json.as_bytes()).map_err(|e| {
            LedgerError::Snapshot(format!("Failed to write {}: {}", staging.path().display(), e))
        })?;
        staging.persist(path).map_err(|e| {
            LedgerError::Snapshot(format!("Failed to replace {}: {}", path.display(), e))
        })?;

        Ok(())
    }

    /// Read a snapshot; a missing file is `None`
    pub fn load(path: &Path) -> LedgerResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(path).map_err(|e| {
            LedgerError::Snapshot(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let snapshot = serde_json::from_str(&json).map_err(|e| {
            LedgerError::Snapshot(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        Ok(Some(snapshot))
    }
}
