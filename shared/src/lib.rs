//! Shared types and domain rules for the VendorPulse platform
//!
//! This crate holds everything that does not touch the database: typed
//! enumerations, the purchase-order state machine, line-item aggregation,
//! the vendor scoring computation and input validation.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
