//! In-memory region catalog
//!
//! This crate provides:
//! - **Region catalog** absorbing leader heartbeats under epoch gating
//! - **Key-range index** for point lookups and ordered range scans
//! - **Store and peer-state indexes** for placement and health queries
//! - **Top-N selection** over named region metrics
//!
//! # Example
//!
//! ```rust
//! use region_catalog::{RegionCatalog, RegionMetric};
//! use region_core::{Peer, RegionRecord};
//!
//! let catalog = RegionCatalog::new();
//!
//! catalog.ingest(
//!     RegionRecord::new(2, b"a".to_vec(), b"m".to_vec(), Peer::new(1, 1))
//!         .with_epoch(1, 1)
//!         .with_written_bytes(4096),
//! );
//! catalog.ingest(
//!     RegionRecord::new(3, b"m".to_vec(), b"".to_vec(), Peer::new(2, 2))
//!         .with_epoch(1, 1),
//! );
//!
//! assert_eq!(catalog.get_by_key(b"q").unwrap().id, 3);
//!
//! let hottest = catalog.top_regions(RegionMetric::WriteFlow, Some(1));
//! assert_eq!(hottest[0].id, 2);
//! ```

mod catalog;
mod key_range;
mod metric;
mod peer_state;
mod snapshot;
mod store_index;
mod top_n;

pub use catalog::{IngestOutcome, RegionCatalog};
pub use metric::{RegionFilter, RegionLess, RegionMetric};
pub use snapshot::CatalogSnapshot;
pub use top_n::top_n;

// Re-export types from region-core for convenience
pub use region_core::types::{
    DownPeer, Peer, PeerId, RegionId, RegionRecord, StoreId, StoreRegionStats,
};
pub use region_core::RegionEpoch;
