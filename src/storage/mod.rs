//! Snapshot persistence.
//!
//! A run ends by writing one [`Snapshot`] to a named slot, replacing whatever
//! the slot held before:
//!
//! ```text
//! {
//!   "lastUpdated": "2026-10-19T12:00:00.123Z",
//!   "data": [ { "player": ..., "level": ..., "killer": ..., "time": ..., "timestamp": ..., "id": ... } ]
//! }
//! ```

pub mod local;
#[cfg(feature = "s3")]
pub mod s3;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::DeathRecord;
use crate::services::MAX_RECORDS;

// Re-export for convenience
pub use local::LocalStorage;
#[cfg(feature = "s3")]
pub use s3::S3Storage;

/// Persisted result of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// When the snapshot was written
    pub last_updated: DateTime<Utc>,
    /// At most [`MAX_RECORDS`] records, in table order
    pub data: Vec<DeathRecord>,
}

impl Snapshot {
    pub fn new(records: &[DeathRecord]) -> Self {
        Self {
            last_updated: Utc::now(),
            data: records.iter().take(MAX_RECORDS).cloned().collect(),
        }
    }
}

/// Metadata about a snapshot write.
#[derive(Debug, Clone)]
pub struct SnapshotReceipt {
    pub record_count: usize,
    /// Human-readable location, e.g. a path or `s3://` URI
    pub location: String,
    pub last_updated: DateTime<Utc>,
}

/// Trait for snapshot storage backends.
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Replace the contents of `slot`, creating any missing parents.
    async fn write_bytes(&self, slot: &str, bytes: &[u8]) -> Result<()>;

    /// Read `slot`, returning `None` if it was never written.
    async fn read_bytes(&self, slot: &str) -> Result<Option<Vec<u8>>>;

    /// Describe where `slot` lives.
    fn location(&self, slot: &str) -> String;
}

/// Serialize `records` with a fresh `lastUpdated` and overwrite `slot`.
pub async fn write_snapshot(
    storage: &dyn SnapshotStorage,
    slot: &str,
    records: &[DeathRecord],
) -> Result<SnapshotReceipt> {
    let snapshot = Snapshot::new(records);
    let bytes = serde_json::to_vec_pretty(&snapshot)?;
    storage.write_bytes(slot, &bytes).await?;

    Ok(SnapshotReceipt {
        record_count: snapshot.data.len(),
        location: storage.location(slot),
        last_updated: snapshot.last_updated,
    })
}

/// Load the snapshot held in `slot`, if any.
pub async fn read_snapshot(storage: &dyn SnapshotStorage, slot: &str) -> Result<Option<Snapshot>> {
    match storage.read_bytes(slot).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}
