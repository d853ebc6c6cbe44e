//! Ingestion Gateway Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging, and error handling for the gateway workspace.
//!
//! - **Types**: [`RunId`] and [`RunState`], the identity and lifecycle state of
//!   a workflow run
//! - **Logging**: tracing subscriber setup driven by environment variables
//! - **Errors**: parse errors for the shared types

pub mod error;
pub mod logging;
pub mod types;

pub use error::{CommonError, Result};
pub use types::{PeriodMetadata, RunId, RunState};
