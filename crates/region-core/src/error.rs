//! Error types for the region placement coordinator

use crate::{RegionId, StoreId};
use thiserror::Error;

/// Result type alias using the coordinator Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the region placement coordinator
#[derive(Error, Debug)]
pub enum Error {
    // Lookup errors
    #[error("Region not found: {region_id}")]
    RegionNotFound { region_id: RegionId },

    #[error("No region covers key: {key}")]
    KeyNotCovered { key: String },

    #[error("Store not found: {store_id}")]
    StoreNotFound { store_id: StoreId },

    // Client input errors
    #[error("Invalid metric: {name}")]
    InvalidMetric { name: String },

    #[error("Invalid filter: {name}")]
    InvalidFilter { name: String },

    #[error("Invalid key: {message}")]
    InvalidKey { message: String },

    #[error("Invalid region {region_id}: {reason}")]
    InvalidRegion { region_id: RegionId, reason: String },

    // Configuration errors
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Returns true if the error was caused by a missing record
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::RegionNotFound { .. } | Error::KeyNotCovered { .. } | Error::StoreNotFound { .. }
        )
    }

    /// Returns true if the caller sent something the coordinator cannot act on
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidMetric { .. }
                | Error::InvalidFilter { .. }
                | Error::InvalidKey { .. }
                | Error::InvalidRegion { .. }
                | Error::Serialization(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
