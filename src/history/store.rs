//! Process-wide history store.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::history::record::HistoryRecord;
use crate::observability::metrics;
use crate::relay::{RequestDescription, ResponseEnvelope};

/// Number of records kept unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 100;

/// A thread-safe, capacity-bounded history of executed requests.
///
/// Records are held most recent first. Every operation, reads included,
/// runs under one mutex, so concurrent adds, deletes and clears never
/// interleave. Clones share the same records.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    records: Arc<Mutex<VecDeque<HistoryRecord>>>,
    capacity: usize,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore {
    /// Create an empty store holding up to [`DEFAULT_CAPACITY`] records.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty store holding up to `capacity` records (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: Arc::new(Mutex::new(VecDeque::with_capacity(capacity + 1))),
            capacity,
        }
    }

    /// Record an exchange at the front, evicting the oldest beyond capacity.
    pub fn add(
        &self,
        request: RequestDescription,
        response: impl Into<Option<ResponseEnvelope>>,
    ) -> HistoryRecord {
        let record = HistoryRecord::new(request, response.into());

        let mut records = self.lock();
        records.push_front(record.clone());
        let evicted = records.len().saturating_sub(self.capacity);
        records.truncate(self.capacity);
        let len = records.len();
        drop(records);

        tracing::debug!(id = %record.id, url = %record.url, evicted, "History record added");
        if evicted > 0 {
            metrics::record_history_evictions(evicted);
        }
        metrics::record_history_size(len);

        record
    }

    /// Snapshot of all records, most recent first.
    pub fn list(&self) -> Vec<HistoryRecord> {
        self.lock().iter().cloned().collect()
    }

    /// Look up a record by identifier.
    pub fn get_by_id(&self, id: &str) -> Option<HistoryRecord> {
        self.lock().iter().find(|record| record.id == id).cloned()
    }

    /// Remove the record with `id`. Returns whether one was removed.
    pub fn delete_by_id(&self, id: &str) -> bool {
        let mut records = self.lock();
        let Some(index) = records.iter().position(|record| record.id == id) else {
            return false;
        };
        records.remove(index);
        let len = records.len();
        drop(records);

        tracing::debug!(id = %id, "History record deleted");
        metrics::record_history_size(len);
        true
    }

    /// Remove every record.
    pub fn clear(&self) {
        let mut records = self.lock();
        let removed = records.len();
        records.clear();
        drop(records);

        tracing::debug!(removed, "History cleared");
        metrics::record_history_size(0);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // A panic while holding the lock cannot leave a half-inserted record:
    // every mutation is a single VecDeque call.
    fn lock(&self) -> MutexGuard<'_, VecDeque<HistoryRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};
    use std::collections::HashSet;

    fn request(n: usize) -> RequestDescription {
        RequestDescription::new("GET", format!("http://localhost/items/{n}"))
    }

    fn envelope(status: u16) -> ResponseEnvelope {
        ResponseEnvelope {
            status,
            status_text: "OK".into(),
            headers: Map::new(),
            body: json!({"ok": true}),
            response_time: 3,
            size: 11,
        }
    }

    #[test]
    fn test_empty_at_start() {
        let store = HistoryStore::new();
        assert!(store.list().is_empty());
        assert!(store.is_empty());
        assert_eq!(store.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_add_returns_stored_record_most_recent_first() {
        let store = HistoryStore::new();
        let first = store.add(request(1), envelope(200));
        let second = store.add(request(2), envelope(404));

        let list = store.list();
        assert_eq!(list, vec![second.clone(), first.clone()]);
        assert_eq!(second.response.as_ref().map(|r| r.status), Some(404));
    }

    #[test]
    fn test_capacity_keeps_most_recent() {
        let store = HistoryStore::new();
        let added: Vec<HistoryRecord> = (0..150).map(|n| store.add(request(n), None)).collect();

        let list = store.list();
        assert_eq!(list.len(), DEFAULT_CAPACITY);

        let expected: Vec<HistoryRecord> = added.iter().rev().take(DEFAULT_CAPACITY).cloned().collect();
        assert_eq!(list, expected);
        assert_eq!(list.last().map(|r| r.url.as_str()), Some("http://localhost/items/50"));
    }

    #[test]
    fn test_custom_capacity() {
        let store = HistoryStore::with_capacity(3);
        for n in 0..5 {
            store.add(request(n), None);
        }
        let urls: Vec<String> = store.list().into_iter().map(|r| r.url).collect();
        assert_eq!(
            urls,
            [
                "http://localhost/items/4",
                "http://localhost/items/3",
                "http://localhost/items/2"
            ]
        );
        assert_eq!(HistoryStore::with_capacity(0).capacity(), 1);
    }

    #[test]
    fn test_ids_are_unique() {
        let store = HistoryStore::new();
        for n in 0..100 {
            store.add(request(n), None);
        }
        let ids: HashSet<String> = store.list().into_iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_get_and_delete() {
        let store = HistoryStore::new();
        let kept = store.add(request(1), envelope(200));
        let removed = store.add(request(2), None);

        assert_eq!(store.get_by_id(&removed.id), Some(removed.clone()));
        assert!(store.delete_by_id(&removed.id));
        assert!(store.get_by_id(&removed.id).is_none());
        assert_eq!(store.get_by_id(&kept.id), Some(kept.clone()));

        // Second delete and unknown ids are misses that change nothing.
        assert!(!store.delete_by_id(&removed.id));
        assert!(!store.delete_by_id("never-inserted"));
        assert_eq!(store.list(), vec![kept]);
    }

    #[test]
    fn test_clear() {
        let store = HistoryStore::new();
        let ids: Vec<String> = (0..5).map(|n| store.add(request(n), None).id).collect();

        store.clear();
        assert!(store.list().is_empty());
        for id in &ids {
            assert!(store.get_by_id(id).is_none());
        }

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_list_is_a_snapshot() {
        let store = HistoryStore::new();
        store.add(request(1), None);
        let snapshot = store.list();
        store.add(request(2), None);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_concurrent_adds_and_deletes() {
        let store = HistoryStore::with_capacity(50);
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for n in 0..50 {
                        let record = store.add(request(t * 100 + n), None);
                        if n % 3 == 0 {
                            store.delete_by_id(&record.id);
                        }
                        if n % 17 == 0 {
                            store.get_by_id(&record.id);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let list = store.list();
        assert!(list.len() <= 50);
        let ids: HashSet<&str> = list.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), list.len());
    }
}
