//! Ordered key-range index
//!
//! Maps region start keys to region ids for "which region owns key K" and
//! "which regions overlap [K1, K2)" lookups.

use region_core::{RegionId, RegionRecord};
use std::collections::BTreeMap;

/// Predecessors examined when resolving a key.
///
/// Overlapping ranges only exist while the halves of a split or merge report
/// at different times, so a covering range sits within a few entries of the
/// key or nowhere.
const MAX_LOOKBACK: usize = 8;

/// Ordered index of region ranges keyed by start key.
///
/// Entries are keyed by `(start_key, region_id)` so that two regions may
/// briefly share a start key while a split or merge is being reported.
#[derive(Debug, Default)]
pub struct KeyRangeIndex {
    /// (start_key, region_id) -> end_key
    entries: BTreeMap<(Vec<u8>, RegionId), Vec<u8>>,
}

impl KeyRangeIndex {
    /// Add the range of `record`
    pub fn insert(&mut self, record: &RegionRecord) {
        self.entries
            .insert((record.start_key.clone(), record.id), record.end_key.clone());
    }

    /// Remove the range of `record`, returns false if it was not indexed
    pub fn remove(&mut self, record: &RegionRecord) -> bool {
        self.entries
            .remove(&(record.start_key.clone(), record.id))
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Region whose range contains `key`.
    ///
    /// Picks the greatest start key `<= key` among ranges that have not ended
    /// by `key`, looking back at most `MAX_LOOKBACK` entries.
    pub fn locate(&self, key: &[u8]) -> Option<RegionId> {
        let upper = (key.to_vec(), RegionId::MAX);
        self.entries
            .range(..=upper)
            .rev()
            .take(MAX_LOOKBACK)
            .find(|(_, end)| covers(end, key))
            .map(|((_, id), _)| *id)
    }

    /// Regions intersecting `[start, end)` in ascending start key order.
    ///
    /// An empty `end` means unbounded. `limit` of `None` returns everything.
    pub fn scan(&self, start: &[u8], end: &[u8], limit: Option<usize>) -> Vec<RegionId> {
        let limit = limit.unwrap_or(usize::MAX);
        if limit == 0 || (!end.is_empty() && start >= end) {
            return Vec::new();
        }

        let lower = (start.to_vec(), RegionId::MIN);

        // The region straddling `start`, if any.
        let head = self
            .entries
            .range(..lower.clone())
            .rev()
            .take(MAX_LOOKBACK)
            .find(|(_, region_end)| covers(region_end, start))
            .map(|((_, id), _)| *id);

        let tail = self
            .entries
            .range(lower..)
            .take_while(|((region_start, _), _)| {
                end.is_empty() || region_start.as_slice() < end
            })
            .map(|((_, id), _)| *id);

        head.into_iter().chain(tail).take(limit).collect()
    }

    /// All indexed region ids in ascending start key order
    pub fn ids(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.entries.keys().map(|(_, id)| *id)
    }
}

fn covers(end: &[u8], key: &[u8]) -> bool {
    end.is_empty() || end > key
}
