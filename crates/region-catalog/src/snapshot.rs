//! Serializable catalog state

use crate::catalog::RegionCatalog;
use region_core::{CatalogConfig, RegionRecord};
use serde::{Deserialize, Serialize};

/// Point-in-time copy of every record in a catalog, in start key order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub regions: Vec<RegionRecord>,
}

impl From<&RegionCatalog> for CatalogSnapshot {
    fn from(catalog: &RegionCatalog) -> Self {
        Self {
            regions: catalog
                .list_regions(None)
                .into_iter()
                .map(|r| (*r).clone())
                .collect(),
        }
    }
}

impl CatalogSnapshot {
    /// Rebuild a catalog under `config`, reserving room for at least every
    /// record in the snapshot
    pub fn restore(self, config: &CatalogConfig) -> RegionCatalog {
        let config = CatalogConfig {
            initial_capacity: config.initial_capacity.max(self.regions.len()),
            ..config.clone()
        };
        let catalog = RegionCatalog::with_config(&config);
        for region in self.regions {
            catalog.ingest(region);
        }

        tracing::info!(regions = catalog.region_count(), "Restored catalog snapshot");
        catalog
    }
}

impl From<CatalogSnapshot> for RegionCatalog {
    fn from(snapshot: CatalogSnapshot) -> Self {
        snapshot.restore(&CatalogConfig::default())
    }
}
