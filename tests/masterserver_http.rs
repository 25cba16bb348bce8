//! End-to-end tests: the real router on an ephemeral port, driven over HTTP.

#![allow(clippy::panic)]

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::net::SocketAddr;
use std::path::Path;

use axum::Router;
use tempfile::TempDir;
use tokio::net::TcpListener;

use ufo_masterserver::api;
use ufo_masterserver::config::MasterConfig;
use ufo_masterserver::persistence::{FileStore, LockSettings, MemoryStore, StoreBackend};

async fn spawn_server(store: StoreBackend) -> SocketAddr {
    let config = MasterConfig::default();
    let state = ufo_masterserver::build_state(&config, store);
    let app = Router::new().merge(api::build_router()).with_state(state);

    let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await;
    });
    addr
}

async fn get(addr: SocketAddr, path_and_query: &str) -> (u16, String) {
    let url = format!("http://{addr}{path_and_query}");
    let Ok(client) = reqwest::Client::builder().no_proxy().build() else {
        panic!("client build failed");
    };
    let Ok(response) = client.get(&url).send().await else {
        panic!("request to {url} failed");
    };
    let status = response.status().as_u16();
    let Ok(body) = response.text().await else {
        panic!("body of {url} unreadable");
    };
    (status, body)
}

fn checksum(path: &Path) -> u64 {
    let bytes = std::fs::read(path).unwrap_or_default();
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}

fn file_store(dir: &TempDir) -> FileStore {
    let Ok(store) = FileStore::open(dir.path().join("masterserver.txt"), LockSettings::default())
    else {
        panic!("store open failed");
    };
    store
}

#[tokio::test]
async fn empty_registry_query() {
    let addr = spawn_server(StoreBackend::Memory(MemoryStore::new(LockSettings::default()))).await;
    assert_eq!(
        get(addr, "/ufo/masterserver.php?query").await,
        (200, "0\n".to_string())
    );
}

#[tokio::test]
async fn server_lifecycle_over_http() {
    let addr = spawn_server(StoreBackend::Memory(MemoryStore::new(LockSettings::default()))).await;

    let (status, body) = get(addr, "/ufo/masterserver.php?ping&port=1000").await;
    assert_eq!(status, 200);
    assert_eq!(body, "1\n127.0.0.1 1000\n");

    // Re-ping does not duplicate.
    let (_, body) = get(addr, "/ufo/masterserver.php?ping&port=1000").await;
    assert_eq!(body, "1\n127.0.0.1 1000\n");

    // Heartbeat from an unregistered port is a no-op.
    let (_, body) = get(addr, "/ufo/masterserver.php?heartbeat&port=2000").await;
    assert_eq!(body, "1\n127.0.0.1 1000\n");

    let (_, body) = get(addr, "/masterserver?heartbeat&port=1000").await;
    assert_eq!(body, "1\n127.0.0.1 1000\n");

    let (_, body) = get(addr, "/ufo/masterserver.php?shutdown&port=1000").await;
    assert_eq!(body, "0\n");
    let (_, body) = get(addr, "/ufo/masterserver.php?shutdown&port=1000").await;
    assert_eq!(body, "0\n");
}

#[tokio::test]
async fn missing_port_uses_default_game_port() {
    let addr = spawn_server(StoreBackend::Memory(MemoryStore::new(LockSettings::default()))).await;
    let (_, body) = get(addr, "/ufo/masterserver.php?ping").await;
    assert_eq!(body, "1\n127.0.0.1 27910\n");
}

#[tokio::test]
async fn unknown_operation_leaves_store_untouched() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let store = file_store(&dir);
    let data_path = store.data_path().to_path_buf();
    let addr = spawn_server(StoreBackend::File(store)).await;

    let (_, body) = get(addr, "/ufo/masterserver.php?ping&port=1000").await;
    assert_eq!(body, "1\n127.0.0.1 1000\n");
    let before = checksum(&data_path);

    assert_eq!(
        get(addr, "/ufo/masterserver.php?status").await,
        (200, "Invalid command\n".to_string())
    );
    assert_eq!(
        get(addr, "/ufo/masterserver.php").await,
        (200, "Invalid command\n".to_string())
    );
    assert_eq!(checksum(&data_path), before);
}

#[tokio::test]
async fn malformed_port_is_rejected_without_mutation() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let store = file_store(&dir);
    let data_path = store.data_path().to_path_buf();
    let addr = spawn_server(StoreBackend::File(store)).await;

    let (_, _) = get(addr, "/ufo/masterserver.php?ping&port=1000").await;
    let before = checksum(&data_path);

    for query in ["?ping&port=abc", "?ping&port=0", "?heartbeat&port=99999"] {
        let (status, body) = get(addr, &format!("/ufo/masterserver.php{query}")).await;
        assert_eq!(status, 400, "{query}");
        assert!(body.starts_with("error 1001"), "{query}: {body}");
    }
    assert_eq!(checksum(&data_path), before);
}

#[tokio::test]
async fn repeated_query_keys_are_rejected_without_mutation() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let store = file_store(&dir);
    let data_path = store.data_path().to_path_buf();
    let addr = spawn_server(StoreBackend::File(store)).await;

    let (_, _) = get(addr, "/ufo/masterserver.php?ping&port=1000").await;
    let before = checksum(&data_path);

    for query in ["?ping&ping", "?ping&port=1&port=2", "?shutdown&port=1000&port=1000"] {
        let (status, body) = get(addr, &format!("/ufo/masterserver.php{query}")).await;
        assert_eq!(status, 400, "{query}");
        assert!(body.starts_with("error 1003"), "{query}: {body}");
    }
    assert_eq!(checksum(&data_path), before);

    let (_, body) = get(addr, "/ufo/masterserver.php?query").await;
    assert_eq!(body, "1\n127.0.0.1 1000\n");
}

#[tokio::test]
async fn file_store_is_compacted_on_query() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let store = file_store(&dir);
    let data_path = store.data_path().to_path_buf();
    assert!(std::fs::write(&data_path, "2\n10.0.0.1 1000 0\nbroken\n").is_ok());
    let addr = spawn_server(StoreBackend::File(store)).await;

    let (_, body) = get(addr, "/ufo/masterserver.php?query").await;
    assert_eq!(body, "0\n");
    assert_eq!(std::fs::read_to_string(&data_path).unwrap_or_default(), "");
}

#[tokio::test]
async fn health_reports_version() {
    let addr = spawn_server(StoreBackend::Memory(MemoryStore::new(LockSettings::default()))).await;
    let (status, body) = get(addr, "/health").await;
    assert_eq!(status, 200);
    let Ok(json) = serde_json::from_str::<serde_json::Value>(&body) else {
        panic!("health body is not JSON: {body}");
    };
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn openapi_document_lists_protocol_path() {
    let addr = spawn_server(StoreBackend::Memory(MemoryStore::new(LockSettings::default()))).await;
    let (status, body) = get(addr, "/api-docs/openapi.json").await;
    assert_eq!(status, 200);
    assert!(body.contains("/ufo/masterserver.php"));
}
