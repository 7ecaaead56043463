//! HTTP API for heartbeat intake and region queries
//!
//! Keys travel hex-encoded in both directions, in paths, query strings and
//! bodies alike. Raw URL-escaped keys are rejected with 400: a segment such
//! as `ab` reads as two different keys under the two encodings, so only one
//! form is accepted. `/region/key/61` looks up key `a`.
//!
//! List endpoints answer with `{ "count": n, "regions": [...] }`.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use region_catalog::{IngestOutcome, RegionFilter, RegionMetric};
use region_core::{DownPeer, Error, Peer, RegionEpoch, RegionId, RegionRecord, StoreId};

use crate::middleware::track_requests;
use crate::service::CoordinatorService;

/// Shared state for HTTP handlers
pub type AppState = Arc<CoordinatorService>;

/// Region info for API responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionResponse {
    pub id: RegionId,
    pub start_key: String,
    pub end_key: String,
    pub epoch: RegionEpoch,
    pub peers: Vec<Peer>,
    pub leader: Option<Peer>,
    pub down_peers: Vec<DownPeer>,
    pub pending_peers: Vec<Peer>,
    pub approximate_size: u64,
    pub approximate_keys: u64,
    pub written_bytes: u64,
    pub read_bytes: u64,
}

impl From<&RegionRecord> for RegionResponse {
    fn from(region: &RegionRecord) -> Self {
        Self {
            id: region.id,
            start_key: hex::encode(&region.start_key),
            end_key: hex::encode(&region.end_key),
            epoch: region.epoch,
            peers: region.peers.clone(),
            leader: region.leader,
            down_peers: region.down_peers.clone(),
            pending_peers: region.pending_peers.clone(),
            approximate_size: region.approximate_size,
            approximate_keys: region.approximate_keys,
            written_bytes: region.written_bytes,
            read_bytes: region.read_bytes,
        }
    }
}

/// List of regions for API responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionsResponse {
    pub count: usize,
    pub regions: Vec<RegionResponse>,
}

impl<R: AsRef<RegionRecord>> FromIterator<R> for RegionsResponse {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        let regions: Vec<RegionResponse> = iter
            .into_iter()
            .map(|r| RegionResponse::from(r.as_ref()))
            .collect();
        Self {
            count: regions.len(),
            regions,
        }
    }
}

/// Region heartbeat as reported by a region leader
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegionHeartbeat {
    pub id: RegionId,
    #[serde(with = "hex", default)]
    pub start_key: Vec<u8>,
    #[serde(with = "hex", default)]
    pub end_key: Vec<u8>,
    #[serde(default)]
    pub epoch: RegionEpoch,
    pub peers: Vec<Peer>,
    #[serde(default)]
    pub leader: Option<Peer>,
    #[serde(default)]
    pub down_peers: Vec<DownPeer>,
    #[serde(default)]
    pub pending_peers: Vec<Peer>,
    #[serde(default)]
    pub approximate_size: u64,
    #[serde(default)]
    pub approximate_keys: u64,
    #[serde(default)]
    pub written_bytes: u64,
    #[serde(default)]
    pub read_bytes: u64,
}

impl From<RegionHeartbeat> for RegionRecord {
    fn from(hb: RegionHeartbeat) -> Self {
        RegionRecord {
            id: hb.id,
            start_key: hb.start_key,
            end_key: hb.end_key,
            epoch: hb.epoch,
            peers: hb.peers,
            leader: hb.leader,
            down_peers: hb.down_peers,
            pending_peers: hb.pending_peers,
            approximate_size: hb.approximate_size,
            approximate_keys: hb.approximate_keys,
            written_bytes: hb.written_bytes,
            read_bytes: hb.read_bytes,
        }
    }
}

/// Heartbeat acknowledgement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatResponse {
    pub region_id: RegionId,
    pub outcome: String,
    pub accepted: bool,
}

impl HeartbeatResponse {
    pub fn new(region_id: RegionId, outcome: IngestOutcome) -> Self {
        Self {
            region_id,
            outcome: outcome.as_str().to_string(),
            accepted: outcome.is_accepted(),
        }
    }
}

/// Coordinator status for API response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub uptime: u64,
    pub region_count: usize,
    pub store_count: usize,
    /// Regions with at least one down replica
    pub down_peer_regions: usize,
    /// Regions with at least one pending replica
    pub pending_peer_regions: usize,
    pub timestamp: String,
}

/// Request statistics for one route
#[derive(Debug, Serialize, Deserialize)]
pub struct RouteMetricsResponse {
    pub route: String,
    pub requests: u64,
    pub errors: u64,
    pub p99_latency_us: Option<u64>,
}

/// Request statistics for all routes
#[derive(Debug, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub routes: Vec<RouteMetricsResponse>,
}

/// `?limit=` query; absent or non-positive means unbounded
#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}

/// `?key=&end_key=&limit=` query for range scans
#[derive(Debug, Default, Deserialize)]
pub struct ScanParams {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub end_key: String,
    pub limit: Option<i64>,
}

pub fn parse_limit(limit: Option<i64>) -> Option<usize> {
    limit.filter(|l| *l > 0).map(|l| l as usize)
}

/// Error wrapper mapping catalog errors to HTTP status codes
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        if self.0.is_not_found() {
            StatusCode::NOT_FOUND
        } else if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Create the HTTP API router
pub fn create_router(service: Arc<CoordinatorService>) -> Router {
    let enable_cors = service.config().coordinator.enable_cors;

    let api = Router::new()
        .route("/regions/heartbeat", post(region_heartbeat))
        .route("/region/id/:id", get(get_region_by_id).delete(remove_region))
        .route("/region/key/:key", get(get_region_by_key))
        .route("/regions", get(list_regions))
        .route("/regions/key", get(scan_regions))
        .route("/regions/store/:id", get(list_store_regions))
        .route("/regions/check/:filter", get(check_regions))
        .route("/regions/:metric", get(top_regions))
        .route("/stores/:id/stats", get(get_store_stats))
        .route("/status", get(get_status))
        .route("/metrics", get(get_metrics));

    let router = Router::new()
        .route("/api/health", get(health_check))
        .nest("/api/v1", api)
        .route_layer(middleware::from_fn_with_state(
            service.metrics(),
            track_requests,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(service);

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router.layer(cors)
    } else {
        router
    }
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}

/// Apply one region heartbeat; stale reports are acknowledged, not rejected
async fn region_heartbeat(
    State(service): State<AppState>,
    Json(heartbeat): Json<RegionHeartbeat>,
) -> ApiResult<HeartbeatResponse> {
    let region_id = heartbeat.id;
    let outcome = service.handle_heartbeat(heartbeat.into())?;
    Ok(Json(HeartbeatResponse::new(region_id, outcome)))
}

async fn get_region_by_id(
    State(service): State<AppState>,
    Path(region_id): Path<RegionId>,
) -> ApiResult<RegionResponse> {
    Ok(Json(service.region_by_id_for_api(region_id)?))
}

async fn remove_region(
    State(service): State<AppState>,
    Path(region_id): Path<RegionId>,
) -> ApiResult<RegionResponse> {
    Ok(Json(service.remove_region(region_id)?))
}

/// `key` is hex; a raw key is a 400
async fn get_region_by_key(
    State(service): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<RegionResponse> {
    Ok(Json(service.region_by_key_for_api(&key)?))
}

async fn list_regions(
    State(service): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Json<RegionsResponse> {
    Json(service.regions_for_api(parse_limit(params.limit)))
}

/// `key` and `end_key` are hex, `end_key` empty or absent for unbounded
async fn scan_regions(
    State(service): State<AppState>,
    Query(params): Query<ScanParams>,
) -> ApiResult<RegionsResponse> {
    let regions =
        service.scan_regions_for_api(&params.key, &params.end_key, parse_limit(params.limit))?;
    Ok(Json(regions))
}

async fn list_store_regions(
    State(service): State<AppState>,
    Path(store_id): Path<StoreId>,
    Query(params): Query<LimitParams>,
) -> Json<RegionsResponse> {
    Json(service.store_regions_for_api(store_id, parse_limit(params.limit)))
}

async fn check_regions(
    State(service): State<AppState>,
    Path(filter): Path<String>,
    Query(params): Query<LimitParams>,
) -> ApiResult<RegionsResponse> {
    let filter: RegionFilter = filter.parse()?;
    Ok(Json(service.filtered_regions_for_api(filter, parse_limit(params.limit))))
}

async fn top_regions(
    State(service): State<AppState>,
    Path(metric): Path<String>,
    Query(params): Query<LimitParams>,
) -> ApiResult<RegionsResponse> {
    let metric: RegionMetric = metric.parse()?;
    Ok(Json(service.top_regions_for_api(metric, parse_limit(params.limit))))
}

async fn get_store_stats(
    State(service): State<AppState>,
    Path(store_id): Path<StoreId>,
) -> ApiResult<region_core::StoreRegionStats> {
    Ok(Json(service.store_stats_for_api(store_id)?))
}

async fn get_status(State(service): State<AppState>) -> Json<StatusResponse> {
    Json(service.status_for_api())
}

async fn get_metrics(State(service): State<AppState>) -> Json<MetricsResponse> {
    Json(service.metrics_for_api())
}
