//! Shared helpers for the store integration tests.
//!
//! Each test spins up a tiny axum router on an ephemeral loopback port and
//! points the stores at it.

#![allow(dead_code)] // not every test binary uses every helper

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;

use monarca_storefront::api::ApiClient;
use monarca_storefront::config::StorefrontConfig;
use monarca_storefront::session::{SessionManager, SessionStore};
use monarca_storefront::storage::{MemoryStorage, Storage, keys};

/// Route test logs through `RUST_LOG` (idempotent across test binaries).
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Serve `router` on an ephemeral port and return its address.
pub async fn spawn_api(router: Router) -> SocketAddr {
    init_tracing();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve mock API");
    });
    addr
}

/// Everything a test needs to drive the stores against a mock API.
pub struct TestContext {
    pub storage: Arc<MemoryStorage>,
    pub store: SessionStore,
    pub client: ApiClient,
    pub manager: SessionManager,
}

/// Build stores over fresh in-memory storage against `base_url`.
pub fn context_at(base_url: &str) -> TestContext {
    context_with_storage(base_url, Arc::new(MemoryStorage::new()))
}

/// Build stores over pre-seeded storage against `base_url`.
pub fn context_with_storage(base_url: &str, storage: Arc<MemoryStorage>) -> TestContext {
    let config = StorefrontConfig::new(base_url, "/tmp/unused").expect("config");
    let store = SessionStore::new(storage.clone());
    let client = ApiClient::new(&config, store.clone()).expect("client");
    let manager = SessionManager::new(store.clone(), client.clone());
    TestContext {
        storage,
        store,
        client,
        manager,
    }
}

/// Build stores against a spawned mock server.
pub fn context_for(addr: SocketAddr) -> TestContext {
    context_at(&format!("http://{addr}/"))
}

/// Seed a persisted session holding `token` so `hydrate` restores it.
pub fn seed_session(storage: &MemoryStorage, token: &str) {
    let record = serde_json::json!({
        "token": token,
        "accessToken": "persisted-access",
        "user": { "name": "Juan", "username": "juan", "email": "juan@x.com" },
        "requiresPasswordChange": false,
    });
    storage
        .save(keys::AUTH, &record.to_string())
        .expect("seed session");
}

/// The token currently persisted under the auth key, if any.
pub fn persisted_token(storage: &MemoryStorage) -> Option<String> {
    let raw = storage.load(keys::AUTH).expect("load auth record")?;
    let value: serde_json::Value = serde_json::from_str(&raw).expect("auth record is JSON");
    value["token"].as_str().map(str::to_owned)
}
