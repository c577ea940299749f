//! Load-synthesis engine: arrival process, scheduling, aggregation, driver.

pub mod aggregate;
pub mod arrival;
pub mod driver;
/// Scheduled-event record definitions.
pub mod event;
/// Start-time placement policies and the capacity envelope.
pub mod schedule;

pub use aggregate::{Aggregator, HomeSeries};
pub use arrival::ArrivalProcess;
pub use driver::{HomeResult, run_home};
pub use event::LoadEvent;
pub use schedule::{Envelope, Placed, QueueKind, Scheduler};
