//! Region catalog
//!
//! Owns the canonical region map and every secondary index, absorbs
//! heartbeats and answers point, range, store, predicate and top-N queries.

use crate::key_range::KeyRangeIndex;
use crate::metric::{RegionFilter, RegionMetric};
use crate::peer_state::PeerStateIndex;
use crate::store_index::StoreIndex;
use crate::top_n::top_n;
use parking_lot::RwLock;
use region_core::{
    compare_epoch, CatalogConfig, RegionId, RegionRecord, StoreId, StoreRegionStats,
};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

/// What a heartbeat did to the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// First report for the region
    Created,
    /// Newer epoch replaced the previous record
    Updated,
    /// Same epoch, metrics and peer states refreshed
    Refreshed,
    /// Older epoch, ignored
    Stale,
}

impl IngestOutcome {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, IngestOutcome::Stale)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IngestOutcome::Created => "created",
            IngestOutcome::Updated => "updated",
            IngestOutcome::Refreshed => "refreshed",
            IngestOutcome::Stale => "stale",
        }
    }
}

/// Concurrent in-memory catalog of region metadata.
///
/// The region map and all indexes sit behind one lock, so every mutation is
/// observed all-or-nothing. Readers only hold the lock while cloning out
/// `Arc`s; records themselves are never mutated once installed.
#[derive(Debug)]
pub struct RegionCatalog {
    inner: RwLock<CatalogInner>,
}

#[derive(Debug, Default)]
struct CatalogInner {
    /// Canonical records
    regions: HashMap<RegionId, Arc<RegionRecord>>,

    /// Start key ordering
    key_ranges: KeyRangeIndex,

    /// Store -> regions
    stores: StoreIndex,

    /// Down / pending peer membership
    peer_states: PeerStateIndex,
}

impl CatalogInner {
    fn install(&mut self, record: Arc<RegionRecord>) -> Option<Arc<RegionRecord>> {
        let previous = self.regions.insert(record.id, Arc::clone(&record));
        if let Some(old) = &previous {
            self.unindex(old);
        }
        self.index(&record);
        debug_assert_eq!(self.key_ranges.len(), self.regions.len());
        previous
    }

    fn index(&mut self, record: &RegionRecord) {
        self.key_ranges.insert(record);
        self.stores.insert(record);
        self.peer_states.insert(record);
    }

    fn unindex(&mut self, record: &RegionRecord) {
        let removed = self.key_ranges.remove(record);
        debug_assert!(removed, "region {} missing from key-range index", record.id);
        self.stores.remove(record);
        self.peer_states.remove(record.id);
    }

    fn resolve(&self, ids: impl IntoIterator<Item = RegionId>) -> Vec<Arc<RegionRecord>> {
        ids.into_iter()
            .filter_map(|id| {
                let region = self.regions.get(&id).cloned();
                debug_assert!(region.is_some(), "index references unknown region {}", id);
                region
            })
            .collect()
    }
}

impl Default for RegionCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::with_config(&CatalogConfig::default())
    }

    /// Create an empty catalog with custom configuration
    pub fn with_config(config: &CatalogConfig) -> Self {
        let inner = CatalogInner {
            regions: HashMap::with_capacity(config.initial_capacity),
            ..Default::default()
        };
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Apply one heartbeat.
    ///
    /// A report whose epoch is older than the installed one leaves the catalog
    /// untouched. Equal epochs are accepted so that flow counters and peer
    /// states refresh on every heartbeat.
    pub fn ingest(&self, record: RegionRecord) -> IngestOutcome {
        let mut inner = self.inner.write();

        let current = inner.regions.get(&record.id).cloned();
        let outcome = match &current {
            None => IngestOutcome::Created,
            Some(current) => match compare_epoch(&record.epoch, &current.epoch) {
                Ordering::Less => {
                    tracing::debug!(
                        region_id = record.id,
                        reported = %record.epoch,
                        current = %current.epoch,
                        "Ignored stale region heartbeat"
                    );
                    return IngestOutcome::Stale;
                }
                Ordering::Equal => IngestOutcome::Refreshed,
                Ordering::Greater => IngestOutcome::Updated,
            },
        };

        if let Some(current) = &current {
            if current.start_key != record.start_key || current.end_key != record.end_key {
                tracing::info!(
                    region_id = record.id,
                    epoch = %record.epoch,
                    "Region key range changed"
                );
            }
        }

        tracing::debug!(
            region_id = record.id,
            epoch = %record.epoch,
            outcome = outcome.as_str(),
            "Applied region heartbeat"
        );

        inner.install(Arc::new(record));
        outcome
    }

    /// Remove a region and all of its index entries
    pub fn remove_region(&self, region_id: RegionId) -> Option<Arc<RegionRecord>> {
        let mut inner = self.inner.write();
        let removed = inner.regions.remove(&region_id)?;
        inner.unindex(&removed);
        debug_assert_eq!(inner.key_ranges.len(), inner.regions.len());

        tracing::info!(region_id = region_id, "Removed region");
        Some(removed)
    }

    /// Look up a region by id
    pub fn get_by_id(&self, region_id: RegionId) -> Option<Arc<RegionRecord>> {
        self.inner.read().regions.get(&region_id).cloned()
    }

    /// Look up the region whose range contains `key`
    pub fn get_by_key(&self, key: &[u8]) -> Option<Arc<RegionRecord>> {
        let inner = self.inner.read();
        let region_id = inner.key_ranges.locate(key)?;
        inner.regions.get(&region_id).cloned()
    }

    /// Regions intersecting `[start, end)` in ascending start key order.
    ///
    /// An empty `end` is unbounded; `limit` of `None` returns every match.
    pub fn scan_by_key_range(
        &self,
        start: &[u8],
        end: &[u8],
        limit: Option<usize>,
    ) -> Vec<Arc<RegionRecord>> {
        let inner = self.inner.read();
        let ids = inner.key_ranges.scan(start, end, limit);
        inner.resolve(ids)
    }

    /// All regions in ascending start key order
    pub fn list_regions(&self, limit: Option<usize>) -> Vec<Arc<RegionRecord>> {
        let inner = self.inner.read();
        let ids: Vec<_> = match limit {
            Some(limit) => inner.key_ranges.ids().take(limit).collect(),
            None => inner.key_ranges.ids().collect(),
        };
        inner.resolve(ids)
    }

    /// Regions with a replica on `store_id`
    pub fn list_by_store(&self, store_id: StoreId) -> Vec<Arc<RegionRecord>> {
        let inner = self.inner.read();
        let ids = inner.stores.regions(store_id);
        inner.resolve(ids)
    }

    /// Regions reporting at least one down peer
    pub fn list_down_peer_regions(&self) -> Vec<Arc<RegionRecord>> {
        let inner = self.inner.read();
        let ids = inner.peer_states.down_regions();
        inner.resolve(ids)
    }

    /// Regions reporting at least one pending peer
    pub fn list_pending_peer_regions(&self) -> Vec<Arc<RegionRecord>> {
        let inner = self.inner.read();
        let ids = inner.peer_states.pending_regions();
        inner.resolve(ids)
    }

    /// Regions matching a named predicate, truncated to `limit`
    pub fn filter_regions(
        &self,
        filter: RegionFilter,
        limit: Option<usize>,
    ) -> Vec<Arc<RegionRecord>> {
        let mut regions = match filter {
            RegionFilter::DownPeer => self.list_down_peer_regions(),
            RegionFilter::PendingPeer => self.list_pending_peer_regions(),
        };
        debug_assert!(regions.iter().all(|r| filter.matches(r)));
        if let Some(limit) = limit {
            regions.truncate(limit);
        }
        regions
    }

    /// The `limit` regions ranking highest by `metric`, greatest first.
    ///
    /// `None` returns every region, sorted.
    pub fn top_regions(
        &self,
        metric: RegionMetric,
        limit: Option<usize>,
    ) -> Vec<Arc<RegionRecord>> {
        let regions: Vec<Arc<RegionRecord>> =
            self.inner.read().regions.values().cloned().collect();

        let n = limit.unwrap_or(regions.len());
        let less = metric.comparator();
        top_n(regions, |a, b| less(a, b), n)
    }

    /// Number of regions in the catalog
    pub fn region_count(&self) -> usize {
        self.inner.read().regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.region_count() == 0
    }

    /// Number of regions reporting a down peer
    pub fn down_peer_region_count(&self) -> usize {
        self.inner.read().peer_states.down_count()
    }

    /// Number of regions reporting a pending peer
    pub fn pending_peer_region_count(&self) -> usize {
        self.inner.read().peer_states.pending_count()
    }

    /// Number of regions with a replica on `store_id`
    pub fn store_region_count(&self, store_id: StoreId) -> usize {
        self.inner.read().stores.region_count(store_id)
    }

    /// Stores hosting at least one region
    pub fn store_ids(&self) -> Vec<StoreId> {
        self.inner.read().stores.store_ids()
    }

    /// Aggregate replica and leader counts for one store
    pub fn store_stats(&self, store_id: StoreId) -> StoreRegionStats {
        let mut stats = StoreRegionStats {
            store_id,
            ..Default::default()
        };

        for region in self.list_by_store(store_id) {
            stats.region_count += 1;
            stats.region_size = stats.region_size.saturating_add(region.approximate_size);

            if region.leader.map(|l| l.store_id) == Some(store_id) {
                stats.leader_count += 1;
            }
            stats.pending_peer_count += region
                .pending_peers
                .iter()
                .filter(|p| p.store_id == store_id)
                .count();
            stats.down_peer_count += region
                .down_peers
                .iter()
                .filter(|d| d.peer.store_id == store_id)
                .count();
        }

        stats
    }
}
