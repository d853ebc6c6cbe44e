//! Ingestion Gateway Server Library
//!
//! HTTP front door for a batch workflow engine. Clients upload CSV batches for
//! a reporting period; the gateway stages them on a filesystem shared with the
//! engine, triggers a workflow run that reads them, and lets clients wait for
//! the run to finish and collect its output files.
//!
//! # Architecture
//!
//! - **staging**: per-run folders under `<shared_root>/runs/<run_id>/`
//! - **engine**: the [`engine::WorkflowEngine`] boundary and its Airflow REST
//!   client
//! - **features/runs**: the submit command and the poll query, plus routes
//! - **api**, **middleware**: router assembly, CORS, tracing, body limits
//!
//! A run folder is kept only once the engine has accepted the run; any failed
//! submission removes it again.
//!
//! # Example
//!
//! ```no_run
//! use gateway_server::{api, config::Config, features::RunsState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let state = RunsState::from_config(&config).await?;
//!     api::serve(&config, state, std::future::pending()).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod middleware;
pub mod staging;

pub use error::{ServerError, ServerResult};
