//! In-place accumulation of scheduled events into per-home load series.

use crate::error::Result;
use crate::series::TimeIndex;

/// Two zero-initialized series (active W, reactive VAR) aligned to the full
/// reference-curve grid, updated by half-open range additions.
#[derive(Debug, Clone)]
pub struct Aggregator {
    active_w: Vec<f64>,
    reactive_var: Vec<f64>,
}

impl Aggregator {
    pub fn new(len: usize) -> Self {
        Self {
            active_w: vec![0.0; len],
            reactive_var: vec![0.0; len],
        }
    }

    /// Adds `power_w`/`reactive_var` over grid positions `[from, to)`,
    /// clamped to the grid length.
    pub fn add_range(&mut self, from: usize, to: usize, power_w: f64, reactive_var: f64) {
        let to = to.min(self.active_w.len());
        for i in from..to {
            self.active_w[i] += power_w;
            self.reactive_var[i] += reactive_var;
        }
    }

    /// Active-power series over the full grid.
    pub fn active_w(&self) -> &[f64] {
        &self.active_w
    }

    /// Reactive-power series over the full grid.
    pub fn reactive_var(&self) -> &[f64] {
        &self.reactive_var
    }

    /// Cuts both series down to the inclusive grid position range
    /// `[from, to]`, pairing them with the matching sub-index.
    pub fn truncate(self, grid: &TimeIndex, from: usize, to: usize) -> Result<HomeSeries> {
        let index = grid.slice(from, to)?;
        Ok(HomeSeries {
            index,
            active_w: self.active_w[from..=to].to_vec(),
            reactive_var: self.reactive_var[from..=to].to_vec(),
        })
    }
}

/// The truncated output series of one home, spanning exactly the simulation
/// window at output-grid resolution.
#[derive(Debug, Clone)]
pub struct HomeSeries {
    pub index: TimeIndex,
    pub active_w: Vec<f64>,
    pub reactive_var: Vec<f64>,
}

impl HomeSeries {
    /// Total active energy in watt-hours, assuming a 1-minute grid.
    pub fn total_energy_wh(&self) -> f64 {
        self.active_w.iter().sum::<f64>() / 60.0
    }
}
