//! Store membership index
//!
//! Tracks which regions have a replica on each storage node.

use region_core::{RegionId, RegionRecord, StoreId};
use std::collections::{BTreeSet, HashMap};

/// Store id -> ids of the regions with a peer on that store
#[derive(Debug, Default)]
pub struct StoreIndex {
    stores: HashMap<StoreId, BTreeSet<RegionId>>,
}

impl StoreIndex {
    /// Add an entry for every store in the record's peer set
    pub fn insert(&mut self, record: &RegionRecord) {
        for store_id in record.store_ids() {
            self.stores.entry(store_id).or_default().insert(record.id);
        }
    }

    /// Drop the record's entries, forgetting stores left with no regions
    pub fn remove(&mut self, record: &RegionRecord) {
        for store_id in record.store_ids() {
            if let Some(regions) = self.stores.get_mut(&store_id) {
                regions.remove(&record.id);
                if regions.is_empty() {
                    self.stores.remove(&store_id);
                }
            }
        }
    }

    /// Region ids hosted by `store_id`, ascending
    pub fn regions(&self, store_id: StoreId) -> Vec<RegionId> {
        self.stores
            .get(&store_id)
            .map(|regions| regions.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn region_count(&self, store_id: StoreId) -> usize {
        self.stores.get(&store_id).map(|r| r.len()).unwrap_or(0)
    }

    /// Stores currently hosting at least one region
    pub fn store_ids(&self) -> Vec<StoreId> {
        let mut ids: Vec<_> = self.stores.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
