//! Non-homogeneous Poisson arrival process driven by the reference curve.
//!
//! The instantaneous rate is `lambda(t) = m(t + E[D]) / (E[P] * E[D])`: the
//! reference curve looked ahead by the current population's expected duration,
//! divided by its expected power times expected duration. Inter-arrival times
//! are exponential draws at that rate; the clock only ever moves forward.

use chrono::{NaiveDateTime, TimeDelta};
use rand::Rng;
use rand_distr::{Distribution, Exp};

use crate::appliance::Appliance;
use crate::error::{Error, Result};
use crate::season::{Hemisphere, Season, SeasonalPopulations};
use crate::series::{RefCurve, hours_to_delta};

/// Floor for drawn inter-arrival times, in hours. Keeps numerical underflow
/// from stalling the clock.
pub const MIN_INTERARRIVAL_H: f64 = 3.0e-8;

/// One accepted arrival: when it happened, under which regime, and which
/// appliance was drawn.
#[derive(Debug)]
pub struct Draw<'p> {
    pub at: NaiveDateTime,
    pub season: Season,
    pub appliance: &'p Appliance,
}

/// The per-home arrival clock.
pub struct ArrivalProcess<'c> {
    curve: &'c RefCurve,
    now: NaiveDateTime,
    end: NaiveDateTime,
}

impl<'c> ArrivalProcess<'c> {
    pub fn new(curve: &'c RefCurve, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            curve,
            now: start,
            end,
        }
    }

    /// Current simulated time.
    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    /// Advances the clock by one exponential inter-arrival draw.
    ///
    /// Returns `None` once the advance crosses the horizon end (that draw is
    /// discarded, not recorded). Otherwise re-resolves the seasonal regime at
    /// the new clock value and draws one appliance uniformly from it.
    ///
    /// # Errors
    ///
    /// Curve coverage gaps, a zero rate denominator (population
    /// misconfiguration), or a non-positive derived rate.
    pub fn next<'p>(
        &mut self,
        seasons: &'p SeasonalPopulations,
        hemisphere: Hemisphere,
        rng: &mut impl Rng,
    ) -> Result<Option<Draw<'p>>> {
        let population = seasons.get(Season::for_date(self.now.date(), hemisphere));

        let lookahead = self.now + population.lookahead;
        let reference = self
            .curve
            .value_asof(lookahead)
            .ok_or(Error::CurveCoverage { at: lookahead })?;

        let denom = population.expected_power_w * population.expected_duration_h;
        if denom == 0.0 {
            return Err(Error::RateDenominatorZero);
        }
        let rate = reference / denom;
        if !(rate.is_finite() && rate > 0.0) {
            return Err(Error::NonPositiveRate { rate, at: self.now });
        }

        let interarrival_h = Exp::new(rate)
            .map_err(|_| Error::NonPositiveRate { rate, at: self.now })?
            .sample(rng)
            .max(MIN_INTERARRIVAL_H);
        self.now += hours_to_delta(interarrival_h);

        if self.now >= self.end {
            return Ok(None);
        }

        let season = Season::for_date(self.now.date(), hemisphere);
        let appliance = seasons.get(season).draw(rng);
        Ok(Some(Draw {
            at: self.now,
            season,
            appliance,
        }))
    }
}

/// Margin the reference curve must extend past the horizon end to cover the
/// expected-duration lookahead and late placements.
pub fn lookahead_margin() -> TimeDelta {
    TimeDelta::days(1)
}
