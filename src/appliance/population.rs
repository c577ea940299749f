//! Per-regime appliance population sampling.
//!
//! Power, duration, and shifting windows come from gamma distributions fit by
//! the method of moments; schedulability is a probit-threshold Bernoulli; the
//! archetype is a weighted categorical draw over the seasonal participation
//! vector. The population also carries the expected-value statistics the
//! arrival process derives its rate from.

use chrono::TimeDelta;
use rand::Rng;
use rand::distr::weighted::WeightedIndex;
use rand_distr::{Distribution, Gamma, Normal};
use statrs::distribution::ContinuousCDF;

use crate::appliance::types::{Appliance, ArchetypeTable};
use crate::error::{Error, Result};
use crate::series::hours_to_delta;

/// Floor applied to sampled durations and shifting-window widths, in hours.
/// Guards against zero-length appliances from the gamma tail.
pub const MIN_DURATION_H: f64 = 0.0003;

/// Statistical parameters for one population draw.
#[derive(Debug, Clone)]
pub struct PopulationParams {
    /// Number of appliances to generate.
    pub count: usize,
    /// Fraction of appliances that are schedulable, in [0, 1].
    pub schedulable_fraction: f64,
    pub power_mean_w: f64,
    pub power_std_w: f64,
    pub duration_mean_h: f64,
    pub duration_std_h: f64,
    pub window_mean_h: f64,
    pub window_std_h: f64,
}

impl Default for PopulationParams {
    fn default() -> Self {
        Self {
            count: 100,
            schedulable_fraction: 0.5,
            power_mean_w: 500.0,
            power_std_w: 100.0,
            duration_mean_h: 0.5,
            duration_std_h: 0.25,
            window_mean_h: 6.0,
            window_std_h: 2.0,
        }
    }
}

impl PopulationParams {
    /// Checks every parameter the gamma fits and the probit threshold need.
    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(Error::invalid("population.count", "must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.schedulable_fraction) {
            return Err(Error::invalid(
                "population.schedulable_fraction",
                "must be in [0, 1]",
            ));
        }
        for (name, mean, std) in [
            ("power", self.power_mean_w, self.power_std_w),
            ("duration", self.duration_mean_h, self.duration_std_h),
            ("window", self.window_mean_h, self.window_std_h),
        ] {
            if !(mean.is_finite() && mean > 0.0) || !(std.is_finite() && std > 0.0) {
                return Err(Error::invalid(
                    "population moments",
                    format!("{name} mean and stdev must be positive and finite"),
                ));
            }
        }
        Ok(())
    }
}

/// Gamma distribution fit by moments: `shape = mean^2/std^2`, `scale = std^2/mean`.
fn gamma_from_moments(name: &'static str, mean: f64, std: f64) -> Result<Gamma<f64>> {
    if !(mean.is_finite() && mean > 0.0) || !(std.is_finite() && std > 0.0) {
        return Err(Error::invalid(
            name,
            "gamma fit requires positive mean and stdev",
        ));
    }
    let shape = (mean * mean) / (std * std);
    let scale = (std * std) / mean;
    Gamma::new(shape, scale).map_err(|e| Error::invalid(name, e.to_string()))
}

/// A finite ordered appliance collection for one seasonal regime, plus the
/// expected-value statistics derived from exactly that collection.
#[derive(Debug, Clone)]
pub struct Population {
    appliances: Vec<Appliance>,
    /// Arithmetic mean of the generated power draws, watts.
    pub expected_power_w: f64,
    /// Arithmetic mean of the generated durations, hours.
    pub expected_duration_h: f64,
    /// Expected duration as a time offset, used for the rate lookahead.
    pub lookahead: TimeDelta,
}

impl Population {
    /// Samples a complete population.
    ///
    /// `weights` is the seasonal participation vector over `table` rows:
    /// non-negative, not necessarily normalized, at least one positive entry.
    ///
    /// # Errors
    ///
    /// Invalid parameters or weights fail before any sampling; a non-finite
    /// sample (unreachable with valid parameters) is reported as a
    /// generation fault rather than propagated into the population.
    pub fn sample(
        params: &PopulationParams,
        table: &ArchetypeTable,
        weights: &[f64],
        rng: &mut impl Rng,
    ) -> Result<Self> {
        params.validate()?;
        if weights.len() != table.len() {
            return Err(Error::invalid(
                "participation weights",
                format!(
                    "expected {} weights, one per archetype, got {}",
                    table.len(),
                    weights.len()
                ),
            ));
        }
        let archetype_draw = WeightedIndex::new(weights)
            .map_err(|e| Error::invalid("participation weights", e.to_string()))?;

        let power_dist = gamma_from_moments("power", params.power_mean_w, params.power_std_w)?;
        let duration_dist =
            gamma_from_moments("duration", params.duration_mean_h, params.duration_std_h)?;
        let window_dist =
            gamma_from_moments("window", params.window_mean_h, params.window_std_h)?;
        let unit_normal = Normal::new(0.0, 1.0)
            .map_err(|e| Error::invalid("unit normal", e.to_string()))?;
        // probit of the schedulable fraction; +-inf at the ends is fine, the
        // comparison below then always goes one way
        let schedulable_threshold =
            statrs::distribution::Normal::standard().inverse_cdf(params.schedulable_fraction);

        let mut appliances = Vec::with_capacity(params.count);
        let mut power_sum = 0.0;
        let mut duration_sum = 0.0;

        for index in 0..params.count {
            let power_w = power_dist.sample(rng);
            let duration_h = duration_dist.sample(rng).max(MIN_DURATION_H);
            if !power_w.is_finite() {
                return Err(Error::Generation { quantity: "power" });
            }
            if !duration_h.is_finite() {
                return Err(Error::Generation {
                    quantity: "duration",
                });
            }

            let schedulable = unit_normal.sample(rng) < schedulable_threshold;
            let (window_before_h, window_after_h) = if schedulable {
                let before = window_dist.sample(rng).max(MIN_DURATION_H);
                let after = window_dist.sample(rng).max(MIN_DURATION_H);
                if !(before.is_finite() && after.is_finite()) {
                    return Err(Error::Generation { quantity: "window" });
                }
                (before, after)
            } else {
                (0.0, 0.0)
            };

            let archetype = table.get(archetype_draw.sample(rng));
            let reactive_var = (archetype.reactive_var / archetype.active_w) * power_w;

            power_sum += power_w;
            duration_sum += duration_h;

            appliances.push(Appliance {
                power_w,
                duration_h,
                schedulable,
                window_before_h,
                window_after_h,
                reactive_var,
                zip: archetype.zip,
                index,
            });
        }

        let expected_power_w = power_sum / params.count as f64;
        let expected_duration_h = duration_sum / params.count as f64;
        Ok(Self {
            appliances,
            expected_power_w,
            expected_duration_h,
            lookahead: hours_to_delta(expected_duration_h),
        })
    }

    pub fn appliances(&self) -> &[Appliance] {
        &self.appliances
    }

    pub fn len(&self) -> usize {
        self.appliances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.appliances.is_empty()
    }

    /// Draws one appliance uniformly at random, with replacement.
    pub fn draw(&self, rng: &mut impl Rng) -> &Appliance {
        &self.appliances[rng.random_range(0..self.appliances.len())]
    }
}
