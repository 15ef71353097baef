//! In-process history store
//!
//! Nothing survives a restart. Selected explicitly with
//! `history.backend: memory`.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use tracing::debug;

use super::index::RecordIndex;
use super::{HistoryRecord, HistorySnapshot, HistoryStats, HistoryStore, NewRecord, RetentionPolicy};
use crate::core::error::{Result, TtsError};

#[derive(Default)]
struct MemoryInner {
    index: RecordIndex,
    audio: HashMap<String, Vec<u8>>,
}

/// History store keeping records and audio in memory
pub struct MemoryHistoryStore {
    retention: RetentionPolicy,
    inner: RwLock<MemoryInner>,
}

impl MemoryHistoryStore {
    pub fn new(retention: RetentionPolicy) -> Self {
        Self {
            retention,
            inner: RwLock::new(MemoryInner::default()),
        }
    }

    fn read(&self, location: &str) -> Result<std::sync::RwLockReadGuard<'_, MemoryInner>> {
        self.inner
            .read()
            .map_err(|_| TtsError::internal("Failed to acquire read lock on history", location))
    }

    fn write(&self, location: &str) -> Result<std::sync::RwLockWriteGuard<'_, MemoryInner>> {
        self.inner
            .write()
            .map_err(|_| TtsError::internal("Failed to acquire write lock on history", location))
    }

    fn forget(inner: &mut MemoryInner, removed: &[HistoryRecord]) {
        for record in removed {
            inner.audio.remove(&record.audio_ref);
        }
    }
}

impl Default for MemoryHistoryStore {
    fn default() -> Self {
        Self::new(RetentionPolicy::default())
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    fn append(&self, record: NewRecord, audio: &[u8]) -> Result<HistoryRecord> {
        let mut inner = self.write("MemoryHistoryStore::append")?;

        let record = HistoryRecord::create(
            record,
            audio.len() as u64,
            inner.index.next_sequence(),
            |id| format!("mem:{}", id),
        );
        inner.audio.insert(record.audio_ref.clone(), audio.to_vec());
        inner.index.insert(record.clone());

        let evicted = inner.index.evict_beyond(self.retention.max_files);
        if !evicted.is_empty() {
            debug!("Evicted {} record(s) over max_files", evicted.len());
        }
        Self::forget(&mut inner, &evicted);

        Ok(record)
    }

    fn list(&self) -> Result<Vec<HistoryRecord>> {
        Ok(self.read("MemoryHistoryStore::list")?.index.newest_first())
    }

    fn record(&self, id: &str) -> Result<HistoryRecord> {
        self.read("MemoryHistoryStore::record")?
            .index
            .get(id)
            .cloned()
            .ok_or_else(|| TtsError::record_not_found(id))
    }

    fn get(&self, id: &str) -> Result<Vec<u8>> {
        let inner = self.read("MemoryHistoryStore::get")?;
        inner
            .index
            .get(id)
            .and_then(|record| inner.audio.get(&record.audio_ref))
            .cloned()
            .ok_or_else(|| TtsError::record_not_found(id))
    }

    fn delete(&self, id: &str) -> Result<()> {
        let mut inner = self.write("MemoryHistoryStore::delete")?;
        let record = inner
            .index
            .remove(id)
            .ok_or_else(|| TtsError::record_not_found(id))?;
        inner.audio.remove(&record.audio_ref);
        Ok(())
    }

    fn clear(&self) -> Result<usize> {
        let mut inner = self.write("MemoryHistoryStore::clear")?;
        let removed = inner.index.drain().len();
        inner.audio.clear();
        Ok(removed)
    }

    fn stats(&self) -> Result<HistoryStats> {
        let inner = self.read("MemoryHistoryStore::stats")?;
        Ok(HistoryStats::new(
            inner.index.len(),
            inner.index.total_size(),
            &self.retention,
            self.backend_name(),
        ))
    }

    fn snapshot(&self) -> Result<HistorySnapshot> {
        let inner = self.read("MemoryHistoryStore::snapshot")?;
        Ok(HistorySnapshot {
            records: inner.index.newest_first(),
            stats: HistoryStats::new(
                inner.index.len(),
                inner.index.total_size(),
                &self.retention,
                self.backend_name(),
            ),
        })
    }

    fn prune_older_than(&self, max_age: chrono::Duration) -> Result<usize> {
        let cutoff = Utc::now() - max_age;
        let mut inner = self.write("MemoryHistoryStore::prune_older_than")?;
        let removed = inner.index.remove_older_than(cutoff);
        Self::forget(&mut inner, &removed);
        Ok(removed.len())
    }
}
