//! Win-probability scoring and margin-constrained selection of supplier offers.

pub mod config;
pub mod error;
pub mod quoting;
pub mod telemetry;
