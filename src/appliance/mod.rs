//! Appliance descriptors, archetype table, and per-regime population sampling.

pub mod population;
pub mod types;

pub use population::{MIN_DURATION_H, Population, PopulationParams};
pub use types::{Appliance, Archetype, ArchetypeTable, ZipCoefficients};
