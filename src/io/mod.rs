//! CSV input loading and result export.

pub mod export;
pub mod loader;

pub use export::{export_home, write_events_csv, write_series_csv};
pub use loader::{load_archetypes_csv, load_curve_csv, load_weights_csv, prepare_reference};
