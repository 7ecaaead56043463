//! Drives a live coordinator with concurrent heartbeat reporters, including
//! splits and delayed pre-split reports, and checks the catalog converges.

use anyhow::Result;
use coordinator::{CoordinatorServer, CoordinatorService, ServerConfig};
use rand::seq::SliceRandom;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpListener;

const STORES: u64 = 4;
const REGIONS: u64 = 64;

// Start coordinator on an ephemeral port and return the base URL + shutdown sender
async fn start_coordinator() -> Result<(String, tokio::sync::oneshot::Sender<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let server = CoordinatorServer::with_config(
        CoordinatorService::new(),
        ServerConfig {
            addr,
            request_timeout: Duration::from_secs(10),
        },
    );

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(server.serve(listener, async {
        rx.await.ok();
    }));

    Ok((format!("http://{}", addr), tx))
}

fn boundary(i: u64) -> Vec<u8> {
    if i == 0 || i == REGIONS {
        Vec::new()
    } else {
        vec![(i * 4) as u8]
    }
}

fn heartbeat(id: u64, start: &[u8], end: &[u8], version: u64, written: u64) -> Value {
    let store_id = id % STORES + 1;
    json!({
        "id": id,
        "start_key": hex::encode(start),
        "end_key": hex::encode(end),
        "epoch": {"conf_ver": 1, "version": version},
        "peers": [
            {"id": id * 10, "store_id": store_id},
            {"id": id * 10 + 1, "store_id": store_id % STORES + 1},
        ],
        "leader": {"id": id * 10, "store_id": store_id},
        "written_bytes": written,
    })
}

async fn post(client: &reqwest::Client, base: &str, body: &Value) -> Result<Value> {
    let response = client
        .post(format!("{}/api/v1/regions/heartbeat", base))
        .json(body)
        .send()
        .await?
        .error_for_status()?;
    Ok(response.json().await?)
}

async fn get(client: &reqwest::Client, base: &str, path: &str) -> Result<Value> {
    let response = client
        .get(format!("{}{}", base, path))
        .send()
        .await?
        .error_for_status()?;
    Ok(response.json().await?)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reporters_converge() -> Result<()> {
    let (base, _shutdown) = start_coordinator().await?;
    let client = reqwest::Client::new();

    // Each store reports its regions concurrently, in random order.
    let mut reporters = Vec::new();
    for store in 0..STORES {
        let client = client.clone();
        let base = base.clone();
        reporters.push(tokio::spawn(async move {
            let mut ids: Vec<u64> = (1..=REGIONS).filter(|id| id % STORES == store).collect();
            ids.shuffle(&mut rand::thread_rng());
            for id in ids {
                let body = heartbeat(id, &boundary(id - 1), &boundary(id), 1, id * 100);
                post(&client, &base, &body).await?;
            }
            anyhow::Ok(())
        }));
    }
    for reporter in reporters {
        reporter.await??;
    }

    let all = get(&client, &base, "/api/v1/regions").await?;
    assert_eq!(all["count"], REGIONS);

    // Every byte resolves to the region whose range covers it.
    for byte in (0u8..=255).step_by(7) {
        let uri = format!("/api/v1/region/key/{}", hex::encode([byte]));
        let region = get(&client, &base, &uri).await?;
        let start = hex::decode(region["start_key"].as_str().unwrap_or_default())?;
        let end = hex::decode(region["end_key"].as_str().unwrap_or_default())?;
        assert!(start.as_slice() <= [byte].as_slice());
        assert!(end.is_empty() || [byte].as_slice() < end.as_slice());
    }

    let top = get(&client, &base, "/api/v1/regions/write-flow?limit=3").await?;
    let ids: Vec<u64> = top["regions"]
        .as_array()
        .map(|r| r.iter().filter_map(|r| r["id"].as_u64()).collect())
        .unwrap_or_default();
    assert_eq!(ids, vec![REGIONS, REGIONS - 1, REGIONS - 2]);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_split_survives_delayed_reports() -> Result<()> {
    let (base, _shutdown) = start_coordinator().await?;
    let client = reqwest::Client::new();

    post(&client, &base, &heartbeat(1, b"", b"", 1, 0)).await?;

    // Split region 1 at "m": region 1 keeps [m, ""), new region 2 takes ["", m).
    let split_right = heartbeat(1, b"m", b"", 2, 0);
    let split_left = heartbeat(2, b"", b"m", 2, 0);
    let delayed = heartbeat(1, b"", b"", 1, 0);

    let mut reports = vec![split_right, split_left];
    reports.extend(std::iter::repeat(delayed).take(8));
    reports.shuffle(&mut rand::thread_rng());

    let mut tasks = Vec::new();
    for body in reports {
        let client = client.clone();
        let base = base.clone();
        tasks.push(tokio::spawn(async move { post(&client, &base, &body).await }));
    }
    for task in tasks {
        task.await??;
    }

    let left = get(&client, &base, "/api/v1/region/key/61").await?;
    assert_eq!(left["id"], 2);
    let right = get(&client, &base, "/api/v1/region/key/7a").await?;
    assert_eq!(right["id"], 1);
    assert_eq!(right["epoch"]["version"], 2);

    let all = get(&client, &base, "/api/v1/regions").await?;
    assert_eq!(all["count"], 2);

    Ok(())
}
