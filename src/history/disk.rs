//! On-disk history store
//!
//! Layout of the storage directory:
//!
//! ```text
//! audio_history/
//! ├── history.json        # manifest, newest record first
//! ├── <id>.wav            # one file per record
//! └── ...
//! ```
//!
//! Every mutation builds the next index, writes the manifest atomically
//! (temp file + rename) and only then swaps the in-memory index, so a
//! failed manifest write leaves both disk and memory on the old state.

use std::fs::{self, File};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::index::RecordIndex;
use super::{HistoryRecord, HistorySnapshot, HistoryStats, HistoryStore, NewRecord, RetentionPolicy};
use crate::core::error::{Result, ResultExt, StoreOperation, TtsError};

/// Manifest file name inside the storage directory
pub const MANIFEST_FILE: &str = "history.json";

const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    version: u32,
    records: Vec<HistoryRecord>,
}

/// History store persisting WAV files plus a JSON manifest
pub struct DiskHistoryStore {
    dir: PathBuf,
    retention: RetentionPolicy,
    index: RwLock<RecordIndex>,
}

impl DiskHistoryStore {
    /// Open (or create) a store rooted at `dir`
    ///
    /// Records whose audio file is gone are dropped. An unreadable manifest
    /// is moved aside to `history.json.corrupt` and the store starts empty.
    pub fn open<P: AsRef<Path>>(dir: P, retention: RetentionPolicy) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).store_context(StoreOperation::Open, Some(dir.clone()))?;

        let store = Self {
            retention,
            index: RwLock::new(RecordIndex::default()),
            dir,
        };

        let loaded = store.load_manifest()?;
        let total = loaded.len();
        let (present, missing): (Vec<_>, Vec<_>) = loaded
            .into_iter()
            .partition(|r| store.audio_path(r).is_file());

        let index = RecordIndex::from_records(present);
        if !missing.is_empty() {
            warn!(
                "Dropped {} history record(s) with missing audio files",
                missing.len()
            );
            store.save_manifest(&index)?;
        }

        info!(
            "Opened history store at {:?} ({} of {} records)",
            store.dir,
            index.len(),
            total
        );
        *store.write("DiskHistoryStore::open")? = index;
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    fn audio_path(&self, record: &HistoryRecord) -> PathBuf {
        self.dir.join(&record.audio_ref)
    }

    fn load_manifest(&self) -> Result<Vec<HistoryRecord>> {
        let path = self.manifest_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(TtsError::Store {
                    operation: StoreOperation::Open,
                    message: e.to_string(),
                    path: Some(path),
                })
            }
        };

        match serde_json::from_str::<Manifest>(&content) {
            Ok(manifest) => Ok(manifest.records),
            Err(e) => {
                let aside = self.dir.join(format!("{}.corrupt", MANIFEST_FILE));
                warn!(
                    "History manifest {:?} is unreadable ({}), moving it to {:?}",
                    path, e, aside
                );
                fs::rename(&path, &aside)
                    .store_context(StoreOperation::Manifest, Some(path.clone()))?;
                Ok(Vec::new())
            }
        }
    }

    fn save_manifest(&self, index: &RecordIndex) -> Result<()> {
        let path = self.manifest_path();
        let manifest = Manifest {
            version: MANIFEST_VERSION,
            records: index.newest_first(),
        };
        let content = serde_json::to_string_pretty(&manifest)
            .store_context(StoreOperation::Manifest, Some(path.clone()))?;

        let tmp = self.dir.join(format!("{}.tmp", MANIFEST_FILE));
        fs::write(&tmp, content).store_context(StoreOperation::Manifest, Some(tmp.clone()))?;
        fs::rename(&tmp, &path).store_context(StoreOperation::Manifest, Some(path))?;
        Ok(())
    }

    fn remove_files(&self, records: &[HistoryRecord]) {
        for record in records {
            let path = self.audio_path(record);
            if let Err(e) = fs::remove_file(&path) {
                if e.kind() != ErrorKind::NotFound {
                    warn!("Failed to remove audio file {:?}: {}", path, e);
                }
            }
        }
    }

    fn read(&self, location: &str) -> Result<std::sync::RwLockReadGuard<'_, RecordIndex>> {
        self.index
            .read()
            .map_err(|_| TtsError::internal("Failed to acquire read lock on history", location))
    }

    fn write(&self, location: &str) -> Result<std::sync::RwLockWriteGuard<'_, RecordIndex>> {
        self.index
            .write()
            .map_err(|_| TtsError::internal("Failed to acquire write lock on history", location))
    }

    /// Apply `mutate` to a copy of the index, persist it, then swap it in
    fn commit<F>(&self, location: &str, mutate: F) -> Result<Vec<HistoryRecord>>
    where
        F: FnOnce(&mut RecordIndex) -> Result<Vec<HistoryRecord>>,
    {
        let mut guard = self.write(location)?;
        let mut next = guard.clone();
        let removed = mutate(&mut next)?;
        self.save_manifest(&next)?;
        *guard = next;
        drop(guard);

        self.remove_files(&removed);
        Ok(removed)
    }
}

impl HistoryStore for DiskHistoryStore {
    fn backend_name(&self) -> &'static str {
        "disk"
    }

    fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    fn append(&self, record: NewRecord, audio: &[u8]) -> Result<HistoryRecord> {
        let mut guard = self.write("DiskHistoryStore::append")?;

        let record = HistoryRecord::create(
            record,
            audio.len() as u64,
            guard.next_sequence(),
            |id| format!("{}.wav", id),
        );
        let audio_path = self.audio_path(&record);
        write_or_discard(&audio_path, |file| file.write_all(audio))?;

        let mut next = guard.clone();
        next.insert(record.clone());
        let evicted = next.evict_beyond(self.retention.max_files);

        if let Err(e) = self.save_manifest(&next) {
            discard(&audio_path);
            return Err(e);
        }
        *guard = next;
        drop(guard);

        if !evicted.is_empty() {
            debug!("Evicted {} record(s) over max_files", evicted.len());
            self.remove_files(&evicted);
        }
        Ok(record)
    }

    fn list(&self) -> Result<Vec<HistoryRecord>> {
        Ok(self.read("DiskHistoryStore::list")?.newest_first())
    }

    fn record(&self, id: &str) -> Result<HistoryRecord> {
        self.read("DiskHistoryStore::record")?
            .get(id)
            .cloned()
            .ok_or_else(|| TtsError::record_not_found(id))
    }

    fn get(&self, id: &str) -> Result<Vec<u8>> {
        let path = {
            let index = self.read("DiskHistoryStore::get")?;
            let record = index.get(id).ok_or_else(|| TtsError::record_not_found(id))?;
            self.audio_path(record)
        };

        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Audio file for history record {} vanished, pruning it", id);
                self.commit("DiskHistoryStore::get", |next| {
                    next.remove(id);
                    Ok(Vec::new())
                })?;
                Err(TtsError::record_not_found(id))
            }
            Err(e) => Err(TtsError::Store {
                operation: StoreOperation::Read,
                message: e.to_string(),
                path: Some(path),
            }),
        }
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.commit("DiskHistoryStore::delete", |next| {
            next.remove(id)
                .map(|record| vec![record])
                .ok_or_else(|| TtsError::record_not_found(id))
        })?;
        Ok(())
    }

    fn clear(&self) -> Result<usize> {
        let removed = self.commit("DiskHistoryStore::clear", |next| Ok(next.drain()))?;
        info!("Cleared {} history record(s)", removed.len());
        Ok(removed.len())
    }

    fn stats(&self) -> Result<HistoryStats> {
        let index = self.read("DiskHistoryStore::stats")?;
        Ok(HistoryStats::new(
            index.len(),
            index.total_size(),
            &self.retention,
            self.backend_name(),
        ))
    }

    fn snapshot(&self) -> Result<HistorySnapshot> {
        let index = self.read("DiskHistoryStore::snapshot")?;
        Ok(HistorySnapshot {
            records: index.newest_first(),
            stats: HistoryStats::new(
                index.len(),
                index.total_size(),
                &self.retention,
                self.backend_name(),
            ),
        })
    }

    fn prune_older_than(&self, max_age: chrono::Duration) -> Result<usize> {
        let cutoff = Utc::now() - max_age;
        {
            let index = self.read("DiskHistoryStore::prune_older_than")?;
            if index.newest_first().iter().all(|r| r.timestamp >= cutoff) {
                return Ok(0);
            }
        }
        let removed = self.commit("DiskHistoryStore::prune_older_than", |next| {
            Ok(next.remove_older_than(cutoff))
        })?;
        Ok(removed.len())
    }
}

/// Create `path` and fill it; a failed write leaves no file behind
fn write_or_discard<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let result = File::create(path).and_then(|mut file| write(&mut file));
    if result.is_err() {
        discard(path);
    }
    result.store_context(StoreOperation::Append, Some(path.to_path_buf()))
}

/// Remove a file this store just wrote
fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != ErrorKind::NotFound {
            warn!("Failed to roll back {:?}: {}", path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn new_record(text: &str) -> NewRecord {
        NewRecord {
            text: text.to_string(),
            voice_id: "expr-voice-2-f".to_string(),
            engine_id: "kitten".to_string(),
        }
    }

    #[test]
    fn test_append_writes_file_and_manifest() {
        let dir = TempDir::new().unwrap();
        let store = DiskHistoryStore::open(dir.path(), RetentionPolicy::default()).unwrap();
        let record = store.append(new_record("hello"), b"RIFFdata").unwrap();

        assert!(dir.path().join(format!("{}.wav", record.id)).is_file());
        assert!(dir.path().join(MANIFEST_FILE).is_file());
        assert_eq!(store.get(&record.id).unwrap(), b"RIFFdata");
        assert_eq!(store.stats().unwrap().total_size_bytes, 8);
    }

    #[test]
    fn test_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let (first, second) = {
            let store = DiskHistoryStore::open(dir.path(), RetentionPolicy::default()).unwrap();
            let first = store.append(new_record("one"), &[1; 4]).unwrap();
            let second = store.append(new_record("two"), &[2; 6]).unwrap();
            (first, second)
        };

        let store = DiskHistoryStore::open(dir.path(), RetentionPolicy::default()).unwrap();
        let ids: Vec<_> = store.list().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second.id.clone(), first.id.clone()]);
        assert_eq!(store.get(&second.id).unwrap(), vec![2; 6]);

        // sequence numbering continues after reopen
        let third = store.append(new_record("three"), &[3; 1]).unwrap();
        assert!(third.sequence > second.sequence);
    }

    #[test]
    fn test_missing_files_dropped_on_open() {
        let dir = TempDir::new().unwrap();
        let record = {
            let store = DiskHistoryStore::open(dir.path(), RetentionPolicy::default()).unwrap();
            store.append(new_record("gone"), &[0; 4]).unwrap()
        };
        fs::remove_file(dir.path().join(&record.audio_ref)).unwrap();

        let store = DiskHistoryStore::open(dir.path(), RetentionPolicy::default()).unwrap();
        assert_eq!(store.stats().unwrap().total_files, 0);
    }

    #[test]
    fn test_vanished_file_pruned_on_get() {
        let dir = TempDir::new().unwrap();
        let store = DiskHistoryStore::open(dir.path(), RetentionPolicy::default()).unwrap();
        let record = store.append(new_record("gone"), &[0; 4]).unwrap();
        fs::remove_file(dir.path().join(&record.audio_ref)).unwrap();

        assert!(matches!(
            store.get(&record.id),
            Err(TtsError::NotFound { .. })
        ));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_manifest_set_aside() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(MANIFEST_FILE), "{ not json").unwrap();

        let store = DiskHistoryStore::open(dir.path(), RetentionPolicy::default()).unwrap();
        assert!(store.list().unwrap().is_empty());
        assert!(dir.path().join("history.json.corrupt").is_file());
    }

    #[test]
    fn test_delete_and_clear_remove_files() {
        let dir = TempDir::new().unwrap();
        let store = DiskHistoryStore::open(dir.path(), RetentionPolicy::default()).unwrap();
        let a = store.append(new_record("a"), &[0; 4]).unwrap();
        let b = store.append(new_record("b"), &[0; 4]).unwrap();

        store.delete(&a.id).unwrap();
        assert!(!dir.path().join(&a.audio_ref).exists());
        assert!(matches!(
            store.delete(&a.id),
            Err(TtsError::NotFound { .. })
        ));

        assert_eq!(store.clear().unwrap(), 1);
        assert!(!dir.path().join(&b.audio_ref).exists());
        assert_eq!(store.stats().unwrap().total_files, 0);
    }

    #[test]
    fn test_failed_audio_write_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.wav");

        let err = write_or_discard(&path, |file| {
            file.write_all(b"RIFF")?;
            Err(io::Error::new(ErrorKind::Other, "disk full"))
        })
        .unwrap_err();
        assert!(matches!(
            err,
            TtsError::Store {
                operation: StoreOperation::Append,
                ..
            }
        ));
        assert!(!path.exists());

        write_or_discard(&path, |file| file.write_all(b"RIFF")).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"RIFF");
    }

    #[test]
    fn test_append_into_vanished_dir_fails_cleanly() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("history");
        let store = DiskHistoryStore::open(&root, RetentionPolicy::default()).unwrap();
        fs::remove_dir_all(&root).unwrap();

        assert!(matches!(
            store.append(new_record("lost"), b"RIFF"),
            Err(TtsError::Store { .. })
        ));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_max_files_evicts_oldest_file() {
        let dir = TempDir::new().unwrap();
        let store = DiskHistoryStore::open(
            dir.path(),
            RetentionPolicy {
                max_files: 1,
                auto_cleanup_days: 0,
            },
        )
        .unwrap();
        let old = store.append(new_record("old"), &[0; 4]).unwrap();
        let new = store.append(new_record("new"), &[0; 4]).unwrap();

        assert!(!dir.path().join(&old.audio_ref).exists());
        assert_eq!(store.list().unwrap()[0].id, new.id);
    }
}
