//! SteadyCut Common Utilities
//!
//! Shared infrastructure for all SteadyCut crates:
//! - Error taxonomy and result aliases
//! - Configuration loading, including pipeline thresholds
//! - Tracing/logging initialization

pub mod config;
pub mod error;
pub mod logging;

pub use config::*;
pub use error::*;
