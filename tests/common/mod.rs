//! Test helpers for web API tests.
//!
//! Provides an in-process TestServer over a temporary storage root and a real
//! listening target server for forwarding tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum_test::TestServer;
use tempfile::TempDir;

use filerelay::config::{Config, ForwardConfig};
use filerelay::web::handlers::AppState;
use filerelay::web::router::create_router;
use filerelay::{FileStorage, Forwarder, WebServer};

/// In-process server plus the temporary directory backing its storage root.
pub struct TestContext {
    pub server: TestServer,
    pub temp_dir: TempDir,
}

impl TestContext {
    /// Storage root of this server.
    pub fn root(&self) -> PathBuf {
        self.temp_dir.path().join("store")
    }
}

/// Create a test server with an empty storage root.
pub fn create_test_server() -> TestContext {
    create_test_server_with_limit(None)
}

/// Create a test server whose uploads are capped at `limit` bytes.
pub fn create_test_server_with_limit(limit: Option<u64>) -> TestContext {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let storage = FileStorage::new(temp_dir.path().join("store"))
        .expect("Failed to create storage")
        .with_max_upload_size(limit);
    let forwarder = Forwarder::new(&ForwardConfig::default()).expect("Failed to create forwarder");
    let app_state = Arc::new(AppState::new(storage, forwarder));

    let router = create_router(app_state, &[]);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestContext { server, temp_dir }
}

/// A real server listening on a random local port.
pub struct TargetServer {
    pub addr: SocketAddr,
    pub temp_dir: TempDir,
}

impl TargetServer {
    /// Base URL suitable for the `target` query parameter.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Storage root of the target.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }
}

/// Start a target server backed by its own temporary storage root.
pub async fn spawn_target_server() -> TargetServer {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.storage.data_dir = temp_dir.path().display().to_string();

    let addr = WebServer::new(&config)
        .expect("Failed to create target server")
        .run_with_addr()
        .await
        .expect("Failed to start target server");

    TargetServer { addr, temp_dir }
}
