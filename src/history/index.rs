//! Arena of history records with an id index and running totals

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::HistoryRecord;

/// Records in insertion order plus an id → offset map
///
/// The total size is maintained on every insert and removal, so it always
/// equals the sum over the current records.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordIndex {
    records: Vec<HistoryRecord>,
    offsets: HashMap<String, usize>,
    total_size: u64,
    next_sequence: u64,
}

impl RecordIndex {
    /// Rebuild from loaded records (any order)
    pub fn from_records(mut records: Vec<HistoryRecord>) -> Self {
        records.sort_by(|a, b| (a.timestamp, a.sequence).cmp(&(b.timestamp, b.sequence)));
        let mut index = Self::default();
        for record in records {
            if index.offsets.contains_key(&record.id) {
                continue;
            }
            index.next_sequence = index.next_sequence.max(record.sequence + 1);
            index.push(record);
        }
        index
    }

    /// Sequence number for the next insert
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    fn push(&mut self, record: HistoryRecord) {
        self.total_size += record.size_bytes;
        self.offsets.insert(record.id.clone(), self.records.len());
        self.records.push(record);
    }

    pub fn insert(&mut self, record: HistoryRecord) {
        self.next_sequence = self.next_sequence.max(record.sequence + 1);
        self.push(record);
    }

    pub fn get(&self, id: &str) -> Option<&HistoryRecord> {
        self.offsets.get(id).map(|&i| &self.records[i])
    }

    pub fn remove(&mut self, id: &str) -> Option<HistoryRecord> {
        let offset = self.offsets.remove(id)?;
        let record = self.records.remove(offset);
        for later in &self.records[offset..] {
            if let Some(slot) = self.offsets.get_mut(&later.id) {
                *slot -= 1;
            }
        }
        self.total_size -= record.size_bytes;
        Some(record)
    }

    /// Remove every record, returning them
    pub fn drain(&mut self) -> Vec<HistoryRecord> {
        self.offsets.clear();
        self.total_size = 0;
        std::mem::take(&mut self.records)
    }

    /// Evict the oldest records until at most `max` remain (0 = no limit)
    pub fn evict_beyond(&mut self, max: usize) -> Vec<HistoryRecord> {
        if max == 0 || self.records.len() <= max {
            return Vec::new();
        }
        let victims: Vec<String> = self
            .oldest_first()
            .into_iter()
            .take(self.records.len() - max)
            .map(|r| r.id.clone())
            .collect();
        victims.iter().filter_map(|id| self.remove(id)).collect()
    }

    /// Remove records strictly older than `cutoff`
    pub fn remove_older_than(&mut self, cutoff: DateTime<Utc>) -> Vec<HistoryRecord> {
        let victims: Vec<String> = self
            .records
            .iter()
            .filter(|r| r.timestamp < cutoff)
            .map(|r| r.id.clone())
            .collect();
        victims.iter().filter_map(|id| self.remove(id)).collect()
    }

    fn oldest_first(&self) -> Vec<&HistoryRecord> {
        let mut sorted: Vec<&HistoryRecord> = self.records.iter().collect();
        sorted.sort_by(|a, b| (a.timestamp, a.sequence).cmp(&(b.timestamp, b.sequence)));
        sorted
    }

    /// Records ordered by timestamp descending, newest insertion first on ties
    pub fn newest_first(&self) -> Vec<HistoryRecord> {
        self.oldest_first().into_iter().rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(id: &str, secs: i64, sequence: u64, size: u64) -> HistoryRecord {
        HistoryRecord {
            id: id.to_string(),
            timestamp: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
            text: id.to_string(),
            preview: id.to_string(),
            voice_id: "v".to_string(),
            engine_id: "e".to_string(),
            size_bytes: size,
            audio_ref: id.to_string(),
            sequence,
        }
    }

    #[test]
    fn test_totals_follow_mutations() {
        let mut index = RecordIndex::default();
        index.insert(record("a", 0, 0, 10));
        index.insert(record("b", 1, 1, 20));
        index.insert(record("c", 2, 2, 30));
        assert_eq!(index.total_size(), 60);

        assert_eq!(index.remove("b").unwrap().size_bytes, 20);
        assert_eq!(index.total_size(), 40);
        assert!(index.remove("b").is_none());
        // offsets after the removed slot still resolve
        assert_eq!(index.get("c").unwrap().size_bytes, 30);

        assert_eq!(index.drain().len(), 2);
        assert_eq!(index.total_size(), 0);
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn test_ties_broken_by_insertion() {
        let mut index = RecordIndex::default();
        index.insert(record("first", 5, 0, 1));
        index.insert(record("second", 5, 1, 1));
        index.insert(record("older", 1, 2, 1));

        let ids: Vec<_> = index.newest_first().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["second", "first", "older"]);
    }

    #[test]
    fn test_evict_oldest() {
        let mut index = RecordIndex::default();
        for (i, id) in ["a", "b", "c", "d"].iter().enumerate() {
            index.insert(record(id, i as i64, i as u64, 5));
        }
        let evicted: Vec<_> = index.evict_beyond(2).into_iter().map(|r| r.id).collect();
        assert_eq!(evicted, vec!["a", "b"]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.total_size(), 10);
        assert!(index.evict_beyond(0).is_empty());
    }

    #[test]
    fn test_remove_older_than() {
        let mut index = RecordIndex::default();
        index.insert(record("old", 0, 0, 1));
        index.insert(record("new", 100, 1, 1));
        let cutoff = Utc.timestamp_opt(1_700_000_050, 0).unwrap();
        let removed = index.remove_older_than(cutoff);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, "old");
        assert!(index.get("new").is_some());
    }

    #[test]
    fn test_from_records_restores_sequence() {
        let index = RecordIndex::from_records(vec![record("b", 1, 7, 2), record("a", 0, 3, 1)]);
        assert_eq!(index.next_sequence(), 8);
        assert_eq!(index.total_size(), 3);
        assert_eq!(index.newest_first()[0].id, "b");
    }
}
