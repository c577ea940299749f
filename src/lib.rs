//! Bottom-up residential load synthesis.
//!
//! Generates per-household demand time series by drawing ZIP-characterized
//! appliance events from a non-homogeneous Poisson arrival process anchored
//! to a reference system load curve, optionally under a capacity-constrained
//! scheduling queue.

pub mod appliance;
pub mod config;
pub mod error;
pub mod io;
/// Fleet runner and the shared simulation context.
pub mod runner;
pub mod season;
pub mod series;
/// Load-synthesis engine: arrival process, scheduling, aggregation, driver.
pub mod sim;

pub use error::{Error, Result};
