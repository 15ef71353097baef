//! Generation history
//!
//! Append-only log of completed generations with point deletes, full clear
//! and exact aggregate statistics. Two stores implement [`HistoryStore`]:
//!
//! - [`MemoryHistoryStore`]: records and audio in process memory
//! - [`DiskHistoryStore`]: one WAV file per record plus a JSON manifest,
//!   surviving restarts
//!
//! Mutations (`append`, `delete`, `clear`, pruning) are mutually exclusive;
//! reads observe a consistent snapshot.

mod disk;
mod index;
mod memory;

pub use disk::{DiskHistoryStore, MANIFEST_FILE};
pub use memory::MemoryHistoryStore;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::core::error::Result;

/// Characters of text kept in the listing preview
pub const PREVIEW_CHARS: usize = 200;

/// Metadata for a record about to be appended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub text: String,
    pub voice_id: String,
    pub engine_id: String,
}

/// A persisted generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Time-ordered unique id
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// Full input text
    pub text: String,
    /// First 200 characters of the text
    pub preview: String,
    pub voice_id: String,
    pub engine_id: String,
    /// Size of the stored WAV in bytes
    pub size_bytes: u64,
    /// Store-specific handle to the audio bytes
    pub audio_ref: String,
    /// Insertion counter, breaks timestamp ties
    #[serde(default)]
    pub sequence: u64,
}

impl HistoryRecord {
    pub(crate) fn create(new: NewRecord, size_bytes: u64, sequence: u64, audio_ref: impl FnOnce(&str) -> String) -> Self {
        let id = uuid::Uuid::now_v7().to_string();
        let audio_ref = audio_ref(&id);
        let preview = new.text.chars().take(PREVIEW_CHARS).collect();
        Self {
            id,
            timestamp: Utc::now(),
            text: new.text,
            preview,
            voice_id: new.voice_id,
            engine_id: new.engine_id,
            size_bytes,
            audio_ref,
            sequence,
        }
    }
}

/// Retention limits applied by a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Cap on stored records, oldest evicted first (0 = unbounded)
    pub max_files: usize,
    /// Age after which cleanup removes records (0 = never)
    pub auto_cleanup_days: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_files: 100,
            auto_cleanup_days: 7,
        }
    }
}

impl RetentionPolicy {
    pub fn unbounded() -> Self {
        Self {
            max_files: 0,
            auto_cleanup_days: 0,
        }
    }

    /// Maximum record age, if age-based cleanup is enabled
    pub fn max_age(&self) -> Option<chrono::Duration> {
        (self.auto_cleanup_days > 0).then(|| chrono::Duration::days(self.auto_cleanup_days as i64))
    }
}

/// Aggregate statistics over the current record set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total_files: usize,
    pub total_size_bytes: u64,
    pub total_size_mb: f64,
    pub max_files: usize,
    pub auto_cleanup_days: u32,
    pub backend: String,
}

impl HistoryStats {
    pub(crate) fn new(total_files: usize, total_size_bytes: u64, retention: &RetentionPolicy, backend: &str) -> Self {
        Self {
            total_files,
            total_size_bytes,
            total_size_mb: (total_size_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0,
            max_files: retention.max_files,
            auto_cleanup_days: retention.auto_cleanup_days,
            backend: backend.to_string(),
        }
    }
}

/// Records and stats taken under one read
#[derive(Debug, Clone, Serialize)]
pub struct HistorySnapshot {
    /// Newest first
    pub records: Vec<HistoryRecord>,
    pub stats: HistoryStats,
}

/// Persistence of generation records and their audio
pub trait HistoryStore: Send + Sync {
    /// Short backend name (`memory`, `disk`)
    fn backend_name(&self) -> &'static str;

    /// Retention limits in effect
    fn retention(&self) -> RetentionPolicy;

    /// Store audio and create its record
    ///
    /// The record and the stats change together; when `max_files` is
    /// exceeded the oldest records are evicted in the same step.
    fn append(&self, record: NewRecord, audio: &[u8]) -> Result<HistoryRecord>;

    /// All records, newest first (insertion order breaks timestamp ties)
    fn list(&self) -> Result<Vec<HistoryRecord>>;

    /// Metadata of one record
    fn record(&self, id: &str) -> Result<HistoryRecord>;

    /// Audio bytes of one record
    fn get(&self, id: &str) -> Result<Vec<u8>>;

    /// Remove one record and its audio; `NotFound` if it does not exist
    fn delete(&self, id: &str) -> Result<()>;

    /// Remove everything, returning how many records were removed
    fn clear(&self) -> Result<usize>;

    fn stats(&self) -> Result<HistoryStats>;

    /// Records and stats from a single consistent read
    fn snapshot(&self) -> Result<HistorySnapshot>;

    /// Remove records older than `max_age`, returning how many were removed
    fn prune_older_than(&self, max_age: chrono::Duration) -> Result<usize>;
}

/// Apply the store's age limit once
pub fn run_cleanup(store: &dyn HistoryStore) -> Result<usize> {
    match store.retention().max_age() {
        Some(max_age) => store.prune_older_than(max_age),
        None => Ok(0),
    }
}

/// Periodically prune records older than the store's age limit
///
/// Returns `None` when age-based cleanup is disabled. The first pass runs
/// immediately.
pub fn spawn_cleanup_task(store: Arc<dyn HistoryStore>, every: Duration) -> Option<JoinHandle<()>> {
    store.retention().max_age()?;

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let store = Arc::clone(&store);
            match tokio::task::spawn_blocking(move || run_cleanup(store.as_ref())).await {
                Ok(Ok(0)) => {}
                Ok(Ok(removed)) => info!("History cleanup removed {} record(s)", removed),
                Ok(Err(e)) => warn!("History cleanup failed: {}", e),
                Err(e) => warn!("History cleanup task failed: {}", e),
            }
        }
    }))
}
