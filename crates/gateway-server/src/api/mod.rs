pub mod response;

use crate::config::Config;
use crate::features::{self, FeatureState, RunsState};
use crate::middleware;
use axum::{response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::watch;

/// Bind the configured address and serve until `shutdown` resolves.
///
/// In-flight requests (long polls included) get `shutdown_timeout_secs` to
/// finish once shutdown starts; whatever is still running is then dropped.
pub async fn serve(
    config: &Config,
    state: RunsState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state, config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let (stopping_tx, mut stopping_rx) = watch::channel(false);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            let _ = stopping_tx.send(true);
        })
        .into_future();

    let drain = Duration::from_secs(config.server.shutdown_timeout_secs);
    let drain_deadline = async move {
        if stopping_rx.wait_for(|stopping| *stopping).await.is_err() {
            std::future::pending::<()>().await;
        }
        tracing::info!("Waiting up to {} seconds for connections to close", drain.as_secs());
        tokio::time::sleep(drain).await;
    };

    tokio::select! {
        result = server => result?,
        _ = drain_deadline => {
            tracing::warn!("Shutdown timeout elapsed, dropping open connections");
        },
    }

    Ok(())
}

/// Full application router with middleware applied.
pub fn create_router(state: RunsState, config: &Config) -> Router {
    let api_v1 = features::router(FeatureState { runs: state });

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/v1", api_v1)
        .layer(middleware::body_limit_layer(&config.server))
        .layer(middleware::cors_layer(&config.cors))
        .layer(middleware::tracing_layer())
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Ingestion Gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
