//! JSON snapshot files.
//!
//! A snapshot file holds one serialized [`SchemaSnapshot`]. The
//! `snapshot` backend diffs two such files, which allows comparing a live
//! database against a structure captured earlier with `dbdiff dump`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dbdiff_core::{Comparator, Delta, SchemaSnapshot};
use tracing::{debug, info};

use crate::differ::{Differ, DifferConfig};
use crate::error::{DbDiffError, Result};

/// Reads a snapshot file.
pub async fn load(path: impl AsRef<Path>) -> Result<SchemaSnapshot> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path).await?;
    let snapshot: SchemaSnapshot = match serde_json::from_str(&content) {
        Ok(snapshot) => snapshot,
        Err(source) => {
            return Err(DbDiffError::InvalidSnapshot {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    debug!(
        path = %path.display(),
        tables = snapshot.tables.len(),
        "Loaded snapshot"
    );
    Ok(snapshot)
}

/// Writes a snapshot file as indented JSON.
pub async fn save(path: impl AsRef<Path>, snapshot: &SchemaSnapshot) -> Result<()> {
    let path = path.as_ref();
    let content = serde_json::to_string_pretty(snapshot)?;
    tokio::fs::write(path, content).await?;
    info!(
        path = %path.display(),
        tables = snapshot.tables.len(),
        "Wrote snapshot"
    );
    Ok(())
}

/// Diff backend over two snapshot files.
#[derive(Debug)]
pub struct SnapshotDiffer {
    newer: SchemaSnapshot,
    older: SchemaSnapshot,
    comparator: Comparator,
}

impl SnapshotDiffer {
    /// Backend identifier.
    pub const NAME: &'static str = "snapshot";

    /// Loads both files named in `config`.
    pub async fn open(config: &DifferConfig) -> Result<Self> {
        let newer = load(PathBuf::from(&config.newer)).await?;
        let older = load(PathBuf::from(&config.older)).await?;
        Ok(Self::from_snapshots(newer, older, config))
    }

    /// Builds the backend from snapshots already in memory.
    #[must_use]
    pub fn from_snapshots(
        newer: SchemaSnapshot,
        older: SchemaSnapshot,
        config: &DifferConfig,
    ) -> Self {
        let (newer, older) = match config.table_prefix.as_deref() {
            Some(prefix) => (newer.filter_prefix(prefix), older.filter_prefix(prefix)),
            None => (newer, older),
        };
        Self {
            newer,
            older,
            comparator: Comparator::with_options(config.comparator.clone()),
        }
    }
}

#[async_trait]
impl Differ for SnapshotDiffer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    async fn diff(&self) -> Result<Delta> {
        Ok(self.comparator.compare(&self.older, &self.newer))
    }
}
