use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use coordinator::{create_router, CoordinatorService};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    create_router(Arc::new(CoordinatorService::new()))
}

async fn call(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => request.body(Body::empty())?,
    };

    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Ok((status, value))
}

fn heartbeat(id: u64, start: &[u8], end: &[u8], store_id: u64) -> Value {
    json!({
        "id": id,
        "start_key": hex::encode(start),
        "end_key": hex::encode(end),
        "epoch": {"conf_ver": 1, "version": 1},
        "peers": [{"id": id, "store_id": store_id}],
        "leader": {"id": id, "store_id": store_id},
    })
}

const HEARTBEAT: &str = "/api/v1/regions/heartbeat";

async fn report(router: &Router, body: Value) -> Result<Value> {
    let (status, value) = call(router, Method::POST, HEARTBEAT, Some(body)).await?;
    assert_eq!(status, StatusCode::OK, "heartbeat rejected: {}", value);
    Ok(value)
}

fn region_ids(value: &Value) -> Vec<u64> {
    value["regions"]
        .as_array()
        .map(|regions| regions.iter().filter_map(|r| r["id"].as_u64()).collect())
        .unwrap_or_default()
}

async fn abcd_router() -> Result<Router> {
    let router = app();
    report(&router, heartbeat(2, b"a", b"b", 1)).await?;
    report(&router, heartbeat(3, b"b", b"c", 1)).await?;
    report(&router, heartbeat(4, b"c", b"d", 2)).await?;
    Ok(router)
}

#[tokio::test]
async fn test_health() -> Result<()> {
    let (status, body) = call(&app(), Method::GET, "/api/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn test_heartbeat_then_lookup() -> Result<()> {
    let router = app();

    let ack = report(&router, heartbeat(2, b"a", b"b", 1)).await?;
    assert_eq!(ack["outcome"], "created");
    assert_eq!(ack["accepted"], true);

    let (status, region) = call(&router, Method::GET, "/api/v1/region/id/2", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(region["start_key"], "61");
    assert_eq!(region["end_key"], "62");
    assert_eq!(region["leader"]["store_id"], 1);

    let (status, region) = call(&router, Method::GET, "/api/v1/region/key/61ff", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(region["id"], 2);

    let (status, _) = call(&router, Method::GET, "/api/v1/region/key/62", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&router, Method::GET, "/api/v1/region/id/3", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&router, Method::GET, "/api/v1/region/key/not-hex", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_keys_are_hex_only() -> Result<()> {
    let router = abcd_router().await?;

    // Raw key `b` is rejected; the same key is addressed as `62`.
    let (status, _) = call(&router, Method::GET, "/api/v1/region/key/b", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = call(&router, Method::GET, "/api/v1/region/key/62", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 3);

    let (status, body) = call(&router, Method::GET, "/api/v1/region/key/zz", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap_or_default().contains("zz"));

    let (status, _) = call(&router, Method::GET, "/api/v1/regions/key?key=b", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_stale_heartbeat_is_acknowledged_and_ignored() -> Result<()> {
    let router = app();

    let mut newer = heartbeat(5, b"a", b"c", 1);
    newer["epoch"] = json!({"conf_ver": 2, "version": 2});
    report(&router, newer).await?;

    let mut older = heartbeat(5, b"x", b"y", 9);
    older["epoch"] = json!({"conf_ver": 2, "version": 1});
    let ack = report(&router, older).await?;
    assert_eq!(ack["outcome"], "stale");
    assert_eq!(ack["accepted"], false);

    let (_, region) = call(&router, Method::GET, "/api/v1/region/id/5", None).await?;
    assert_eq!(region["start_key"], "61");
    let (_, stores) = call(&router, Method::GET, "/api/v1/regions/store/9", None).await?;
    assert_eq!(stores["count"], 0);
    Ok(())
}

#[tokio::test]
async fn test_malformed_heartbeats_rejected() -> Result<()> {
    let router = app();

    let zero_id = heartbeat(0, b"a", b"b", 1);
    let inverted = heartbeat(2, b"c", b"b", 1);
    let mut no_peers = heartbeat(2, b"a", b"b", 1);
    no_peers["peers"] = json!([]);
    no_peers["leader"] = Value::Null;
    let mut foreign_leader = heartbeat(2, b"a", b"b", 1);
    foreign_leader["leader"] = json!({"id": 77, "store_id": 7});
    let mut stray_pending = heartbeat(2, b"a", b"b", 1);
    stray_pending["pending_peers"] = json!([{"id": 8, "store_id": 8}]);

    for body in [zero_id, inverted, no_peers, foreign_leader, stray_pending] {
        let (status, _) = call(&router, Method::POST, HEARTBEAT, Some(body)).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (_, all) = call(&router, Method::GET, "/api/v1/regions", None).await?;
    assert_eq!(all["count"], 0);
    Ok(())
}

#[tokio::test]
async fn test_scan_regions() -> Result<()> {
    let router = abcd_router().await?;
    report(&router, heartbeat(99, &[0xFF, 0xFF, 0xAA], &[0xFF, 0xFF, 0xCC], 1)).await?;

    let (status, body) = call(&router, Method::GET, "/api/v1/regions/key?key=62", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(region_ids(&body), vec![3, 4, 99]);
    assert_eq!(body["count"], 3);

    let (_, body) = call(&router, Method::GET, "/api/v1/regions/key?key=62&limit=1", None).await?;
    assert_eq!(region_ids(&body), vec![3]);

    let uri = "/api/v1/regions/key?key=61&end_key=63";
    let (_, body) = call(&router, Method::GET, uri, None).await?;
    assert_eq!(region_ids(&body), vec![2, 3]);

    let uri = "/api/v1/regions/key?key=62&limit=-1";
    let (_, body) = call(&router, Method::GET, uri, None).await?;
    assert_eq!(region_ids(&body), vec![3, 4, 99]);

    let (_, body) = call(&router, Method::GET, "/api/v1/region/key/ffffbb", None).await?;
    assert_eq!(body["id"], 99);

    let (_, body) = call(&router, Method::GET, "/api/v1/regions?limit=2", None).await?;
    assert_eq!(region_ids(&body), vec![2, 3]);
    Ok(())
}

#[tokio::test]
async fn test_regions_by_store() -> Result<()> {
    let router = abcd_router().await?;

    let (_, body) = call(&router, Method::GET, "/api/v1/regions/store/1", None).await?;
    assert_eq!(region_ids(&body), vec![2, 3]);

    let (_, body) = call(&router, Method::GET, "/api/v1/regions/store/2", None).await?;
    assert_eq!(region_ids(&body), vec![4]);

    let uri = "/api/v1/regions/store/1?limit=1";
    let (_, body) = call(&router, Method::GET, uri, None).await?;
    assert_eq!(region_ids(&body), vec![2]);
    assert_eq!(body["count"], 1);

    for unbounded in ["0", "-3"] {
        let uri = format!("/api/v1/regions/store/1?limit={}", unbounded);
        let (_, body) = call(&router, Method::GET, &uri, None).await?;
        assert_eq!(region_ids(&body), vec![2, 3]);
    }

    let (status, stats) = call(&router, Method::GET, "/api/v1/stores/1/stats", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["region_count"], 2);
    assert_eq!(stats["leader_count"], 2);

    let (status, _) = call(&router, Method::GET, "/api/v1/stores/42/stats", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_region_check() -> Result<()> {
    let router = abcd_router().await?;

    let mut unhealthy = heartbeat(2, b"a", b"b", 1);
    unhealthy["peers"] = json!([{"id": 2, "store_id": 1}, {"id": 13, "store_id": 2}]);
    unhealthy["down_peers"] = json!([{"peer": {"id": 13, "store_id": 2}, "down_seconds": 3600}]);
    unhealthy["pending_peers"] = json!([{"id": 13, "store_id": 2}]);
    report(&router, unhealthy).await?;

    let (status, body) = call(&router, Method::GET, "/api/v1/regions/check/down-peer", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(region_ids(&body), vec![2]);
    assert_eq!(body["regions"][0]["down_peers"][0]["down_seconds"], 3600);

    let (_, body) = call(&router, Method::GET, "/api/v1/regions/check/pending-peer", None).await?;
    assert_eq!(region_ids(&body), vec![2]);

    let (status, _) = call(&router, Method::GET, "/api/v1/regions/check/learner-peer", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, status) = call(&router, Method::GET, "/api/v1/status", None).await?;
    assert_eq!(status["down_peer_regions"], 1);
    assert_eq!(status["pending_peer_regions"], 1);
    Ok(())
}

#[tokio::test]
async fn test_top_regions() -> Result<()> {
    let router = app();
    for (id, start, end, written, read, conf_ver, version) in [
        (1u64, b"a", b"b", 1000u64, 1000u64, 1u64, 1u64),
        (2, b"b", b"c", 2000, 0, 2, 3),
        (3, b"c", b"d", 500, 800, 3, 2),
    ] {
        let mut body = heartbeat(id, start, end, 1);
        body["written_bytes"] = json!(written);
        body["read_bytes"] = json!(read);
        body["epoch"] = json!({"conf_ver": conf_ver, "version": version});
        report(&router, body).await?;
    }

    let top = |uri: &'static str| {
        let router = router.clone();
        async move { call(&router, Method::GET, uri, None).await.map(|(_, v)| region_ids(&v)) }
    };

    assert_eq!(top("/api/v1/regions/writeflow").await?, vec![2, 1, 3]);
    assert_eq!(top("/api/v1/regions/write-flow?limit=2").await?, vec![2, 1]);
    assert_eq!(top("/api/v1/regions/readflow").await?, vec![1, 3, 2]);
    assert_eq!(top("/api/v1/regions/confver").await?, vec![3, 2, 1]);
    assert_eq!(top("/api/v1/regions/confver?limit=2").await?, vec![3, 2]);
    assert_eq!(top("/api/v1/regions/version").await?, vec![2, 3, 1]);
    assert_eq!(top("/api/v1/regions/version?limit=0").await?, vec![2, 3, 1]);

    let (status, _) = call(&router, Method::GET, "/api/v1/regions/latency", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_remove_region() -> Result<()> {
    let router = abcd_router().await?;

    let (status, removed) = call(&router, Method::DELETE, "/api/v1/region/id/3", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(removed["id"], 3);

    let (status, _) = call(&router, Method::DELETE, "/api/v1/region/id/3", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&router, Method::GET, "/api/v1/region/key/62", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = call(&router, Method::GET, "/api/v1/regions/store/1", None).await?;
    assert_eq!(region_ids(&body), vec![2]);
    Ok(())
}

#[tokio::test]
async fn test_status_and_metrics() -> Result<()> {
    let router = abcd_router().await?;
    call(&router, Method::GET, "/api/v1/region/id/404", None).await?;

    let (status, body) = call(&router, Method::GET, "/api/v1/status", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["region_count"], 3);
    assert_eq!(body["store_count"], 2);
    assert_eq!(body["down_peer_regions"], 0);
    assert_eq!(body["pending_peer_regions"], 0);

    let (_, body) = call(&router, Method::GET, "/api/v1/metrics", None).await?;
    let routes = body["routes"].as_array().cloned().unwrap_or_default();

    let heartbeat = routes
        .iter()
        .find(|r| r["route"] == "POST /api/v1/regions/heartbeat")
        .expect("heartbeat route recorded");
    assert_eq!(heartbeat["requests"], 3);
    assert_eq!(heartbeat["errors"], 0);

    let lookup = routes
        .iter()
        .find(|r| r["route"] == "GET /api/v1/region/id/:id")
        .expect("lookup route recorded");
    assert_eq!(lookup["errors"], 1);
    Ok(())
}
