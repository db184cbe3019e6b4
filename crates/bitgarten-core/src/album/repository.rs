//! In-memory album storage.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use super::model::{AlbumDetail, AlbumId, AlbumSummary};

/// Sorted album summaries plus the append-only list of opened albums.
#[derive(Debug, Default)]
pub struct AlbumStore {
    summaries: RwLock<Vec<AlbumSummary>>,
    details: RwLock<Vec<AlbumDetail>>,
    initialized: AtomicBool,
    // Held for a whole bulk replace so two replaces never interleave.
    replacing: Mutex<()>,
}

impl AlbumStore {
    /// Creates an empty, uninitialized store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Summaries, ascending by `date_time_raw`.
    #[must_use]
    pub fn list_albums(&self) -> Vec<AlbumSummary> {
        self.summaries.read().clone()
    }

    /// True once a summary load has completed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Replaces all summaries.
    ///
    /// The list is cleared first, then each summary is inserted and the
    /// whole list re-sorted before the next one. Readers may observe the
    /// partial list between inserts, but it is always sorted. Concurrent
    /// replaces run one after the other, so the result is always exactly
    /// one load's records.
    pub fn replace_summaries(&self, summaries: impl IntoIterator<Item = AlbumSummary>) {
        let _replacing = self.replacing.lock();
        self.summaries.write().clear();
        for summary in summaries {
            let mut list = self.summaries.write();
            list.push(summary);
            list.sort_by_key(|s| s.date_time_raw);
        }
        self.initialized.store(true, Ordering::Release);
        debug!(count = self.summaries.read().len(), "Album summaries replaced");
    }

    /// Appends an opened album. Earlier entries with the same id are kept.
    pub fn append_detail(&self, detail: AlbumDetail) {
        debug!(id = %detail.id, pictures = detail.pictures.len(), "Album detail added");
        self.details.write().push(detail);
    }

    /// First appended detail for `id`.
    #[must_use]
    pub fn album_by_id(&self, id: AlbumId) -> Option<AlbumDetail> {
        self.details.read().iter().find(|d| d.id == id).cloned()
    }

    /// All appended details, in append order.
    #[must_use]
    pub fn details(&self) -> Vec<AlbumDetail> {
        self.details.read().clone()
    }

    /// Number of summaries.
    #[must_use]
    pub fn summary_count(&self) -> usize {
        self.summaries.read().len()
    }

    /// Number of appended details, duplicates included.
    #[must_use]
    pub fn detail_count(&self) -> usize {
        self.details.read().len()
    }

    /// Drops summaries and details and marks the store uninitialized.
    pub fn clear(&self) {
        self.summaries.write().clear();
        self.details.write().clear();
        self.initialized.store(false, Ordering::Release);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn summary(isn: u64, raw: i64) -> AlbumSummary {
        AlbumSummary::new(AlbumId(isn), format!("album {isn}"), raw, "t".into())
    }

    fn detail(id: u64, title: &str) -> AlbumDetail {
        AlbumDetail {
            id: AlbumId(id),
            title: title.to_string(),
            date: chrono::DateTime::default(),
            pictures: Vec::new(),
        }
    }

    #[test]
    fn test_replace_sorts_ascending() {
        let store = AlbumStore::new();
        assert!(!store.is_initialized());

        store.replace_summaries([summary(1, 300), summary(2, 100), summary(3, 200)]);
        let raw: Vec<i64> = store.list_albums().iter().map(|s| s.date_time_raw).collect();
        assert_eq!(raw, vec![100, 200, 300]);
        assert!(store.is_initialized());
    }

    #[test]
    fn test_replace_is_not_a_merge() {
        let store = AlbumStore::new();
        store.replace_summaries([summary(1, 1), summary(2, 2)]);
        store.replace_summaries([summary(3, 3)]);
        let isns: Vec<AlbumId> = store.list_albums().iter().map(|s| s.isn).collect();
        assert_eq!(isns, vec![AlbumId(3)]);
    }

    #[test]
    fn test_concurrent_replaces_do_not_merge() {
        let store = std::sync::Arc::new(AlbumStore::new());
        let records: Vec<AlbumSummary> = (0..200).map(|i| summary(i, i as i64)).collect();

        for _ in 0..50 {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let store = std::sync::Arc::clone(&store);
                    let records = records.clone();
                    std::thread::spawn(move || store.replace_summaries(records))
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
            assert_eq!(store.summary_count(), records.len());
        }
    }

    #[test]
    fn test_equal_timestamps_keep_input_order() {
        let store = AlbumStore::new();
        store.replace_summaries([summary(1, 5), summary(2, 5), summary(3, 1)]);
        let isns: Vec<u64> = store.list_albums().iter().map(|s| s.isn.0).collect();
        assert_eq!(isns, vec![3, 1, 2]);
    }

    #[test]
    fn test_empty_replace_initializes() {
        let store = AlbumStore::new();
        store.replace_summaries(Vec::new());
        assert!(store.is_initialized());
        assert_eq!(store.summary_count(), 0);
    }

    #[test]
    fn test_duplicate_details_are_appended() {
        let store = AlbumStore::new();
        store.append_detail(detail(5, "first"));
        store.append_detail(detail(5, "second"));

        assert_eq!(store.detail_count(), 2);
        assert_eq!(store.album_by_id(AlbumId(5)).unwrap().title, "first");
        assert!(store.album_by_id(AlbumId(6)).is_none());
    }

    #[test]
    fn test_clear() {
        let store = AlbumStore::new();
        store.replace_summaries([summary(1, 1)]);
        store.append_detail(detail(1, "a"));
        store.clear();
        assert!(!store.is_initialized());
        assert_eq!(store.summary_count(), 0);
        assert!(store.details().is_empty());
    }

    proptest! {
        #[test]
        fn prop_summaries_always_sorted(raws in proptest::collection::vec(any::<i64>(), 0..64)) {
            let store = AlbumStore::new();
            let input: Vec<AlbumSummary> = raws
                .iter()
                .enumerate()
                .map(|(i, raw)| summary(i as u64, *raw))
                .collect();
            store.replace_summaries(input);

            let listed = store.list_albums();
            prop_assert_eq!(listed.len(), raws.len());
            prop_assert!(listed.windows(2).all(|w| w[0].date_time_raw <= w[1].date_time_raw));
        }
    }
}
