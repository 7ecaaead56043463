//! Predicate indexes over peer health
//!
//! Keeps the set of regions that currently report down peers and the set
//! that currently report pending peers.

use region_core::{RegionId, RegionRecord};
use std::collections::BTreeSet;

#[derive(Debug, Default)]
pub struct PeerStateIndex {
    down: BTreeSet<RegionId>,
    pending: BTreeSet<RegionId>,
}

impl PeerStateIndex {
    /// Record membership according to the record's down/pending peer lists
    pub fn insert(&mut self, record: &RegionRecord) {
        if record.has_down_peers() {
            self.down.insert(record.id);
        }
        if record.has_pending_peers() {
            self.pending.insert(record.id);
        }
    }

    pub fn remove(&mut self, region_id: RegionId) {
        self.down.remove(&region_id);
        self.pending.remove(&region_id);
    }

    /// Regions with at least one down peer, ascending id
    pub fn down_regions(&self) -> Vec<RegionId> {
        self.down.iter().copied().collect()
    }

    /// Regions with at least one pending peer, ascending id
    pub fn pending_regions(&self) -> Vec<RegionId> {
        self.pending.iter().copied().collect()
    }

    pub fn down_count(&self) -> usize {
        self.down.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
