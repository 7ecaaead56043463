//! Coordinator service
//!
//! Owns the region catalog and translates API requests into catalog calls.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info};

use region_catalog::{IngestOutcome, RegionCatalog, RegionFilter, RegionMetric};
use region_core::{
    Error, RegionId, RegionRecord, Result, RuntimeConfig, StoreId, StoreRegionStats,
};

use crate::http_api::{
    MetricsResponse, RegionResponse, RegionsResponse, RouteMetricsResponse, StatusResponse,
};
use crate::middleware::{HeartbeatValidator, RequestMetrics};

/// Coordinator service shared by all HTTP handlers
#[derive(Clone)]
pub struct CoordinatorService {
    /// Region metadata
    catalog: Arc<RegionCatalog>,

    /// Heartbeat and key checks
    validator: HeartbeatValidator,

    /// Per-route request statistics
    metrics: Arc<RequestMetrics>,

    /// Loaded configuration
    config: Arc<RuntimeConfig>,

    /// Server start time for uptime tracking
    start_time: Instant,
}

impl Default for CoordinatorService {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordinatorService {
    /// Create a coordinator service with default configuration
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Create a coordinator service with custom configuration
    pub fn with_config(config: RuntimeConfig) -> Self {
        let catalog = Arc::new(RegionCatalog::with_config(&config.catalog));
        Self::with_catalog(config, catalog)
    }

    /// Create a coordinator service around an existing catalog
    pub fn with_catalog(config: RuntimeConfig, catalog: Arc<RegionCatalog>) -> Self {
        Self {
            catalog,
            validator: HeartbeatValidator::new(&config.catalog),
            metrics: Arc::new(RequestMetrics::new()),
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    pub fn catalog(&self) -> &Arc<RegionCatalog> {
        &self.catalog
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<RequestMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Validate and apply one heartbeat
    pub fn handle_heartbeat(&self, region: RegionRecord) -> Result<IngestOutcome> {
        if let Err(e) = self.validator.validate_region(&region) {
            debug!(region_id = region.id, error = %e, "Rejected malformed heartbeat");
            return Err(e);
        }
        Ok(self.catalog.ingest(region))
    }

    pub fn region_by_id_for_api(&self, region_id: RegionId) -> Result<RegionResponse> {
        self.catalog
            .get_by_id(region_id)
            .map(|r| RegionResponse::from(r.as_ref()))
            .ok_or(Error::RegionNotFound { region_id })
    }

    /// Look up the region owning a hex-encoded key
    ///
    /// Raw keys are not accepted: a path like `ab` is valid as both forms.
    pub fn region_by_key_for_api(&self, encoded_key: &str) -> Result<RegionResponse> {
        let key = self.validator.decode_key(encoded_key)?;
        self.catalog
            .get_by_key(&key)
            .map(|r| RegionResponse::from(r.as_ref()))
            .ok_or_else(|| Error::KeyNotCovered {
                key: encoded_key.to_string(),
            })
    }

    pub fn regions_for_api(&self, limit: Option<usize>) -> RegionsResponse {
        self.catalog.list_regions(limit).into_iter().collect()
    }

    /// Ordered scan over `[start, end)`, both hex-encoded; empty `end` is unbounded
    pub fn scan_regions_for_api(
        &self,
        start: &str,
        end: &str,
        limit: Option<usize>,
    ) -> Result<RegionsResponse> {
        let start = self.validator.decode_key(start)?;
        let end = self.validator.decode_key(end)?;
        Ok(self
            .catalog
            .scan_by_key_range(&start, &end, limit)
            .into_iter()
            .collect())
    }

    pub fn store_regions_for_api(
        &self,
        store_id: StoreId,
        limit: Option<usize>,
    ) -> RegionsResponse {
        let regions = self.catalog.list_by_store(store_id);
        let n = limit.unwrap_or(regions.len());
        regions.into_iter().take(n).collect()
    }

    pub fn filtered_regions_for_api(
        &self,
        filter: RegionFilter,
        limit: Option<usize>,
    ) -> RegionsResponse {
        self.catalog
            .filter_regions(filter, limit)
            .into_iter()
            .collect()
    }

    pub fn top_regions_for_api(
        &self,
        metric: RegionMetric,
        limit: Option<usize>,
    ) -> RegionsResponse {
        self.catalog
            .top_regions(metric, limit)
            .into_iter()
            .collect()
    }

    /// Drop a region from the catalog, returning its last known state
    pub fn remove_region(&self, region_id: RegionId) -> Result<RegionResponse> {
        let removed = self
            .catalog
            .remove_region(region_id)
            .ok_or(Error::RegionNotFound { region_id })?;

        info!(region_id = region_id, "Region removed via API");
        Ok(RegionResponse::from(removed.as_ref()))
    }

    /// Per-store aggregates; a store hosting no regions is unknown
    pub fn store_stats_for_api(&self, store_id: StoreId) -> Result<StoreRegionStats> {
        let stats = self.catalog.store_stats(store_id);
        if stats.region_count == 0 {
            return Err(Error::StoreNotFound { store_id });
        }
        Ok(stats)
    }

    pub fn status_for_api(&self) -> StatusResponse {
        StatusResponse {
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime: self.uptime_secs(),
            region_count: self.catalog.region_count(),
            store_count: self.catalog.store_ids().len(),
            down_peer_regions: self.catalog.down_peer_region_count(),
            pending_peer_regions: self.catalog.pending_peer_region_count(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn metrics_for_api(&self) -> MetricsResponse {
        let mut routes: Vec<RouteMetricsResponse> = self
            .metrics
            .summary()
            .into_iter()
            .map(|(route, (requests, errors, p99))| RouteMetricsResponse {
                route,
                requests,
                errors,
                p99_latency_us: p99,
            })
            .collect();
        routes.sort_by(|a, b| a.route.cmp(&b.route));
        MetricsResponse { routes }
    }
}
