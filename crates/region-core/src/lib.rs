//! Region Core - Foundation for the region placement coordinator
//!
//! Provides the region metadata model, epoch ordering, error handling
//! and configuration shared by the catalog and the coordinator API.

pub mod config;
pub mod epoch;
pub mod error;
pub mod types;

pub use config::{CatalogConfig, CoordinatorConfig, RuntimeConfig};
pub use epoch::{compare_epoch, RegionEpoch};
pub use error::{Error, Result};
pub use types::*;
