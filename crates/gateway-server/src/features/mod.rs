//! Feature modules implementing the gateway API
//!
//! Each feature is a vertical slice with its own commands, queries, and
//! routes.
//!
//! # Features
//!
//! - **runs**: submit uploaded CSV batches to a workflow and poll their status
//!
//! # Architecture
//!
//! Each feature module follows the structure:
//! - `commands/` - Operations that change state (submit)
//! - `queries/` - Read operations (poll)
//! - `routes.rs` - HTTP route definitions
//! - `types.rs` - Shared types

pub mod runs;
pub mod shared;

use axum::Router;

pub use runs::RunsState;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    pub runs: RunsState,
}

/// Creates the API router with all feature routes mounted
///
/// - `/ingest/:workflow` - Submit a run
/// - `/poll/:run_id` - Wait for a run to finish
pub fn router(state: FeatureState) -> Router<()> {
    Router::new().merge(runs::runs_routes().with_state(state.runs))
}
