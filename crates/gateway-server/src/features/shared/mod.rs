//! Shared utilities for feature modules
//!
//! - **validation**: submission input checks run before anything is staged

pub mod validation;

pub use validation::{
    parse_integer, validate_csv_uploads, validate_email, validate_period, ValidationError,
};
