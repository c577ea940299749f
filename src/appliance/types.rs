//! Value types for appliances and the ZIP archetype table.

use crate::error::{Error, Result};

/// ZIP load-model coefficients: constant-impedance, constant-current, and
/// constant-power shares for active and reactive power.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZipCoefficients {
    pub zp: f64,
    pub ip: f64,
    pub pp: f64,
    pub zq: f64,
    pub iq: f64,
    pub pq: f64,
}

/// One sampled appliance instance inside a regime's population.
///
/// Immutable once generated; discarded together with its population.
#[derive(Debug, Clone)]
pub struct Appliance {
    /// Active power draw in watts.
    pub power_w: f64,
    /// Run duration in hours, floored to a minimum positive epsilon.
    pub duration_h: f64,
    /// Whether the appliance participates in load shifting.
    pub schedulable: bool,
    /// Shifting window before the natural start, hours. Zero when not schedulable.
    pub window_before_h: f64,
    /// Shifting window after the natural start, hours. Zero when not schedulable.
    pub window_after_h: f64,
    /// Reactive power draw in VAR, scaled from the archetype's Q/P ratio.
    pub reactive_var: f64,
    pub zip: ZipCoefficients,
    /// Ordinal index within the population that generated it.
    pub index: usize,
}

/// One row of the archetype characteristics table.
#[derive(Debug, Clone)]
pub struct Archetype {
    pub name: String,
    /// Nominal active power in watts (must be positive; the Q/P ratio divides by it).
    pub active_w: f64,
    /// Nominal reactive power in VAR.
    pub reactive_var: f64,
    pub zip: ZipCoefficients,
}

/// The per-archetype characteristics table shared by all homes.
#[derive(Debug, Clone)]
pub struct ArchetypeTable {
    rows: Vec<Archetype>,
}

impl ArchetypeTable {
    /// Wraps validated rows.
    ///
    /// # Errors
    ///
    /// Fails on an empty table or a row with non-positive nominal active power.
    pub fn new(rows: Vec<Archetype>) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::invalid("archetype table", "must not be empty"));
        }
        for row in &rows {
            if !(row.active_w.is_finite() && row.active_w > 0.0) {
                return Err(Error::invalid(
                    "archetype table",
                    format!("archetype \"{}\" has non-positive active power", row.name),
                ));
            }
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[Archetype] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, i: usize) -> &Archetype {
        &self.rows[i]
    }

    /// Built-in table of common residential archetypes, used by the demo
    /// scenario and tests when no CSV table is supplied.
    pub fn demo() -> Self {
        fn row(
            name: &str,
            active_w: f64,
            reactive_var: f64,
            p: (f64, f64, f64),
            q: (f64, f64, f64),
        ) -> Archetype {
            Archetype {
                name: name.to_string(),
                active_w,
                reactive_var,
                zip: ZipCoefficients {
                    zp: p.0,
                    ip: p.1,
                    pp: p.2,
                    zq: q.0,
                    iq: q.1,
                    pq: q.2,
                },
            }
        }
        // Coefficient triples each sum to 1 per the ZIP identity.
        let rows = vec![
            row("refrigerator", 120.0, 65.0, (1.17, -1.83, 1.66), (7.07, -10.94, 4.87)),
            row("air_conditioner", 1450.0, 590.0, (0.77, 0.04, 0.19), (2.35, -2.67, 1.32)),
            row("resistive_heater", 1800.0, 10.0, (0.92, 0.10, -0.02), (0.15, 0.86, -0.01)),
            row("incandescent_lamp", 100.0, 2.0, (0.47, 0.63, -0.10), (0.56, 0.44, 0.00)),
            row("cfl_lamp", 25.0, 11.0, (0.23, -0.06, 0.83), (0.46, -0.32, 0.86)),
            row("television", 110.0, 40.0, (0.01, -0.16, 1.15), (0.24, 0.30, 0.46)),
            row("washing_machine", 500.0, 210.0, (0.05, 0.31, 0.64), (0.56, 0.40, 0.04)),
            row("microwave", 1050.0, 330.0, (-0.27, 1.16, 0.11), (15.64, -27.91, 13.27)),
        ];
        // demo rows satisfy the constructor invariants
        Self { rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_is_rejected() {
        assert!(ArchetypeTable::new(vec![]).is_err());
    }

    #[test]
    fn non_positive_active_power_is_rejected() {
        let row = Archetype {
            name: "bad".to_string(),
            active_w: 0.0,
            reactive_var: 0.0,
            zip: ZipCoefficients {
                zp: 1.0,
                ip: 0.0,
                pp: 0.0,
                zq: 1.0,
                iq: 0.0,
                pq: 0.0,
            },
        };
        assert!(ArchetypeTable::new(vec![row]).is_err());
    }

    #[test]
    fn demo_table_is_nonempty_and_valid() {
        let table = ArchetypeTable::demo();
        assert!(!table.is_empty());
        assert!(ArchetypeTable::new(table.rows().to_vec()).is_ok());
    }
}
