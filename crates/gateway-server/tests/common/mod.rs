//! Common test utilities for gateway integration tests
//!
//! Each [`TestGateway`] owns a temporary shared root and a wiremock server
//! standing in for the workflow engine, so tests run in isolation.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{MultipartBody, TestGateway};
//!
//! #[tokio::test]
//! async fn test_submit() {
//!     let gateway = TestGateway::start().await;
//!     let request = MultipartBody::new()
//!         .text("week_year", "2023")
//!         .file("data.csv", b"a,b\n1,2\n")
//!         .into_request("/api/v1/ingest/part1");
//!     let (status, body) = gateway.send(request).await;
//! }
//! ```

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use gateway_server::{api, config::Config, features::RunsState};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::MockServer;

const BOUNDARY: &str = "gateway-test-boundary";

/// Router wired to a mock engine over a temporary shared root
pub struct TestGateway {
    pub router: Router,
    pub engine: MockServer,
    pub config: Config,
    _shared: TempDir,
}

impl TestGateway {
    /// Two poll attempts, one second apart.
    pub async fn start() -> Self {
        Self::with_max_attempts(2).await
    }

    pub async fn with_max_attempts(max_attempts: u32) -> Self {
        let engine = MockServer::start().await;
        let shared = TempDir::new().expect("Failed to create shared root");

        let mut config = Config::default();
        config.staging.shared_root = shared.path().to_path_buf();
        config.engine.base_url = format!("{}/api/v1", engine.uri());
        config.engine.timeout_secs = 5;
        config.polling.interval_secs = 1;
        config.polling.max_attempts = max_attempts;

        let state = RunsState::from_config(&config)
            .await
            .expect("Failed to build gateway state");
        let router = api::create_router(state, &config);

        Self {
            router,
            engine,
            config,
            _shared: shared,
        }
    }

    pub fn shared_root(&self) -> &Path {
        &self.config.staging.shared_root
    }

    pub fn run_folder(&self, run_id: &str) -> PathBuf {
        self.shared_root().join("runs").join(run_id)
    }

    /// Number of run folders currently on disk.
    pub fn run_folder_count(&self) -> usize {
        match std::fs::read_dir(self.shared_root().join("runs")) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }

    /// Send a request and decode the JSON body.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);

        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }
}

/// Hand-built `multipart/form-data` body
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Form with valid period metadata and no files.
    pub fn with_metadata() -> Self {
        Self::new()
            .text("week_year", "2023")
            .text("week_num", "10")
            .text("notify_email", "demo@example.com")
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    /// Add an entry to the `files` field.
    pub fn file(mut self, filename: &str, content: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; \
                 filename=\"{filename}\"\r\nContent-Type: text/csv\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(content);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn into_request(mut self, uri: &str) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(self.body))
            .unwrap()
    }
}
