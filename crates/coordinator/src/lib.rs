//! Region placement coordinator HTTP service
//!
//! This crate exposes the region catalog over HTTP:
//! - **Heartbeat intake**: validated region reports applied under epoch gating
//! - **Region queries**: by id, by key, by key range, by store
//! - **Scheduler views**: unhealthy-replica checks and named-metric top-N
//!
//! # Example
//!
//! ```ignore
//! use coordinator::{CoordinatorServer, CoordinatorService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let service = CoordinatorService::new();
//!     CoordinatorServer::new(service)?.run().await?;
//!     Ok(())
//! }
//! ```

pub mod http_api;
pub mod middleware;
pub mod server;
pub mod service;

// Re-export main types
pub use http_api::create_router;
pub use server::{CoordinatorServer, ServerConfig};
pub use service::CoordinatorService;
