//! # Vitrine Snapshot
//!
//! Point-in-time snapshots of a [`MemoryStore`].
//!
//! ## Internal Implementation Detail
//!
//! **This crate is an internal implementation detail of Vitrine.** Depend on
//! the main `vitrine` crate instead; this crate's API may change without
//! notice between minor versions.
//!
//! ---
//!
//! A snapshot directory holds two files:
//!
//! - `STORE_SNAPSHOT`: every table of the store, framed and checksummed (see
//!   [`format`])
//! - `SNAPSHOT_META`: bincode-encoded [`SnapshotMeta`] describing it
//!
//! Snapshots seed fixture data for tests and demos and let a process pick up
//! where a previous one left off.
//!
//! ## Usage
//!
//! ```ignore
//! use vitrine_snapshot::SnapshotManager;
//!
//! let mut manager = SnapshotManager::new();
//! let meta = manager.create_snapshot(&store, "/var/lib/shop/fixtures")?;
//! let restored = SnapshotManager::restore("/var/lib/shop/fixtures", schema)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};
use vitrine_core::{Error, Result, Schema};
use vitrine_store::MemoryStore;

pub mod format;

/// Snapshot data file name
pub const SNAPSHOT_FILE: &str = "STORE_SNAPSHOT";

/// Snapshot metadata file name
const SNAPSHOT_META_FILE: &str = "SNAPSHOT_META";

/// Snapshot metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    /// Unique snapshot ID
    pub id: String,
    /// Timestamp when snapshot was created (Unix milliseconds)
    pub timestamp: u64,
    /// Directory the snapshot was written to
    pub path: String,
    /// Row count per table
    pub tables: Vec<TableSummary>,
    /// Size of the data file in bytes
    pub size: u64,
    /// CRC32 of the data file body
    pub checksum: u32,
}

impl SnapshotMeta {
    /// Total rows across all tables
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }
}

/// Row count of one table at snapshot time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    /// Resource name
    pub name: String,
    /// Number of rows
    pub rows: usize,
}

/// Snapshot configuration
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    /// Read the data file back and verify it after writing
    pub verify_checksums: bool,
    /// fsync the data file before returning
    pub sync: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            verify_checksums: true,
            sync: false,
        }
    }
}

/// Snapshot manager
#[derive(Debug, Default)]
pub struct SnapshotManager {
    config: SnapshotConfig,
    /// Snapshots created by this manager
    snapshots: Vec<SnapshotMeta>,
}

impl SnapshotManager {
    /// Create a snapshot manager with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a snapshot manager with custom configuration
    pub fn with_config(config: SnapshotConfig) -> Self {
        Self {
            config,
            snapshots: Vec::new(),
        }
    }

    /// Write a snapshot of `store` into `dest`, creating the directory if needed.
    pub fn create_snapshot(
        &mut self,
        store: &MemoryStore,
        dest: impl AsRef<Path>,
    ) -> Result<SnapshotMeta> {
        let dest = dest.as_ref().to_path_buf();
        fs::create_dir_all(&dest)?;

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        let id = format!("snap_{}", timestamp);

        let image = store.export()?;
        let tables = image
            .tables
            .iter()
            .map(|t| TableSummary {
                name: t.name.clone(),
                rows: t.rows.len(),
            })
            .collect();

        let bytes = format::encode(&image)?;
        let checksum = format::stored_checksum(&bytes)?;

        let data_path = dest.join(SNAPSHOT_FILE);
        {
            let file = File::create(&data_path)?;
            let mut writer = BufWriter::new(file);
            writer.write_all(&bytes)?;
            writer.flush()?;
            if self.config.sync {
                writer.get_ref().sync_all()?;
            }
        }

        if self.config.verify_checksums {
            let written = read_file(&data_path)?;
            if format::stored_checksum(&written)? != checksum {
                return Err(Error::Corruption(format!(
                    "checksum mismatch after writing {:?}",
                    data_path
                )));
            }
            format::decode(&written)?;
        }

        let meta = SnapshotMeta {
            id,
            timestamp,
            path: dest.to_string_lossy().to_string(),
            tables,
            size: bytes.len() as u64,
            checksum,
        };

        self.write_metadata(&dest, &meta)?;
        info!(id = %meta.id, rows = meta.total_rows(), path = %meta.path, "vitrine.snapshot.create");

        self.snapshots.push(meta.clone());
        Ok(meta)
    }

    /// Write snapshot metadata to file
    fn write_metadata(&self, dest: &Path, meta: &SnapshotMeta) -> Result<()> {
        let meta_path = dest.join(SNAPSHOT_META_FILE);
        let file = File::create(&meta_path)?;
        let mut writer = BufWriter::new(file);

        let encoded = bincode::serialize(meta).map_err(|e| Error::Serialization(e.to_string()))?;

        writer.write_all(&encoded)?;
        writer.flush()?;

        Ok(())
    }

    /// Load snapshot metadata from a snapshot directory
    pub fn load_snapshot(snapshot_dir: impl AsRef<Path>) -> Result<SnapshotMeta> {
        let contents = read_file(&snapshot_dir.as_ref().join(SNAPSHOT_META_FILE))?;
        bincode::deserialize(&contents).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Rebuild a store for `schema` from the snapshot in `snapshot_dir`.
    ///
    /// Fails with a corruption error when the data file is damaged, carries an
    /// unknown format version or does not fit the schema.
    pub fn restore(snapshot_dir: impl AsRef<Path>, schema: Schema) -> Result<MemoryStore> {
        let data_path = snapshot_dir.as_ref().join(SNAPSHOT_FILE);
        let bytes = read_file(&data_path)?;

        let image = format::decode(&bytes).map_err(|e| {
            warn!(path = ?data_path, error = %e, "vitrine.snapshot.restore_failed");
            e
        })?;
        let rows = image.row_count();
        let store = MemoryStore::from_image(schema, image)?;

        info!(path = ?data_path, rows, "vitrine.snapshot.restore");
        Ok(store)
    }

    /// List all tracked snapshots
    pub fn list_snapshots(&self) -> &[SnapshotMeta] {
        &self.snapshots
    }

    /// Get snapshot by ID
    pub fn get_snapshot(&self, id: &str) -> Option<&SnapshotMeta> {
        self.snapshots.iter().find(|s| s.id == id)
    }

    /// Delete a snapshot and its directory
    pub fn delete_snapshot(&mut self, snapshot_id: &str) -> Result<bool> {
        let pos = self.snapshots.iter().position(|s| s.id == snapshot_id);

        if let Some(idx) = pos {
            let snapshot = self.snapshots.remove(idx);

            let path = PathBuf::from(&snapshot.path);
            if path.exists() {
                fs::remove_dir_all(&path)?;
            }

            Ok(true)
        } else {
            Ok(false)
        }
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut contents = Vec::new();
    reader.read_to_end(&mut contents)?;
    Ok(contents)
}
