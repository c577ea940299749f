//! Sorted-time-index primitives: as-of lookup and the reference load curve.
//!
//! The as-of lookup ("latest value at or before a timestamp") is the single
//! most load-bearing primitive in this engine; it is implemented as an exact
//! binary search over a strictly increasing index, never interpolation.

use chrono::{NaiveDateTime, TimeDelta};

use crate::error::{Error, Result};

/// Output grid resolution for aggregated series and event rounding.
pub fn output_step() -> TimeDelta {
    TimeDelta::minutes(1)
}

/// Converts fractional hours to a time delta at microsecond precision.
pub fn hours_to_delta(hours: f64) -> TimeDelta {
    TimeDelta::microseconds((hours * 3_600_000_000.0).round() as i64)
}

/// A strictly increasing sequence of timestamps with binary-search lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeIndex {
    stamps: Vec<NaiveDateTime>,
}

impl TimeIndex {
    /// Builds an index from pre-sorted timestamps.
    ///
    /// # Errors
    ///
    /// Fails if the sequence is empty or not strictly increasing.
    pub fn new(stamps: Vec<NaiveDateTime>) -> Result<Self> {
        if stamps.is_empty() {
            return Err(Error::invalid("time index", "must not be empty"));
        }
        if stamps.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::invalid(
                "time index",
                "timestamps must be strictly increasing with no duplicates",
            ));
        }
        Ok(Self { stamps })
    }

    /// Builds a regular grid from `start` to `end` inclusive at `step`.
    pub fn regular(start: NaiveDateTime, end: NaiveDateTime, step: TimeDelta) -> Result<Self> {
        if step <= TimeDelta::zero() {
            return Err(Error::invalid("step", "must be positive"));
        }
        if end < start {
            return Err(Error::invalid("time index", "end precedes start"));
        }
        let mut stamps = Vec::new();
        let mut t = start;
        while t <= end {
            stamps.push(t);
            t += step;
        }
        Self::new(stamps)
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    pub fn first(&self) -> NaiveDateTime {
        self.stamps[0]
    }

    pub fn last(&self) -> NaiveDateTime {
        self.stamps[self.stamps.len() - 1]
    }

    pub fn stamp(&self, i: usize) -> NaiveDateTime {
        self.stamps[i]
    }

    pub fn stamps(&self) -> &[NaiveDateTime] {
        &self.stamps
    }

    /// Index of the latest stamp at or before `t`, or `None` when `t`
    /// precedes the whole index.
    pub fn asof(&self, t: NaiveDateTime) -> Option<usize> {
        let n = self.stamps.partition_point(|s| *s <= t);
        if n == 0 { None } else { Some(n - 1) }
    }

    /// Index of the first stamp at or after `t` (`len()` when past the end).
    /// Used as the exclusive end of half-open interval lookups.
    pub fn lower_bound(&self, t: NaiveDateTime) -> usize {
        self.stamps.partition_point(|s| *s < t)
    }

    /// Sub-index over the inclusive position range `[from, to]`.
    pub fn slice(&self, from: usize, to: usize) -> Result<Self> {
        if from > to || to >= self.stamps.len() {
            return Err(Error::invalid("slice", "index range out of bounds"));
        }
        Ok(Self {
            stamps: self.stamps[from..=to].to_vec(),
        })
    }
}

/// The rescaled reference load curve the arrival rate is derived from.
#[derive(Debug, Clone)]
pub struct RefCurve {
    index: TimeIndex,
    values: Vec<f64>,
}

impl RefCurve {
    /// Pairs an index with its values.
    ///
    /// # Errors
    ///
    /// Fails on a length mismatch or any negative/non-finite value.
    pub fn new(index: TimeIndex, values: Vec<f64>) -> Result<Self> {
        if index.len() != values.len() {
            return Err(Error::invalid(
                "reference curve",
                format!(
                    "index has {} stamps but {} values were given",
                    index.len(),
                    values.len()
                ),
            ));
        }
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(Error::invalid(
                "reference curve",
                "values must be finite and non-negative",
            ));
        }
        Ok(Self { index, values })
    }

    /// A flat curve on a regular 1-minute grid, handy for tests and demos.
    pub fn constant(start: NaiveDateTime, end: NaiveDateTime, value: f64) -> Result<Self> {
        let index = TimeIndex::regular(start, end, output_step())?;
        let values = vec![value; index.len()];
        Self::new(index, values)
    }

    pub fn index(&self) -> &TimeIndex {
        &self.index
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// As-of value lookup.
    pub fn value_asof(&self, t: NaiveDateTime) -> Option<f64> {
        self.index.asof(t).map(|i| self.values[i])
    }

    /// Whether the curve spans `[from, to]`.
    pub fn covers(&self, from: NaiveDateTime, to: NaiveDateTime) -> bool {
        self.index.first() <= from && self.index.last() >= to
    }

    /// Largest value among stamps inside `[from, to]`.
    pub fn peak_within(&self, from: NaiveDateTime, to: NaiveDateTime) -> Option<f64> {
        let lo = self.index.lower_bound(from);
        let hi = self.index.asof(to)?;
        if lo > hi {
            return None;
        }
        Some(
            self.values[lo..=hi]
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max),
        )
    }

    /// Linearly rescales all values into `[base_min, base_max]` using the
    /// min/max observed strictly within `[from, to]`.
    ///
    /// # Errors
    ///
    /// Fails when the band is degenerate or the curve is flat inside the
    /// window (no spread to rescale against).
    pub fn rescaled_to_band(
        &self,
        base_min: f64,
        base_max: f64,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Self> {
        if !(base_min.is_finite() && base_max.is_finite()) || base_min < 0.0 || base_max <= base_min
        {
            return Err(Error::invalid(
                "base band",
                "requires 0 <= base_min < base_max",
            ));
        }
        let lo = self.index.lower_bound(from);
        let hi = self
            .index
            .asof(to)
            .ok_or(Error::CurveCoverage { at: to })?;
        if lo > hi {
            return Err(Error::invalid(
                "rescale window",
                "no curve samples fall inside the simulation window",
            ));
        }
        let window = &self.values[lo..=hi];
        let scale_min = window.iter().copied().fold(f64::INFINITY, f64::min);
        let scale_max = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if scale_max <= scale_min {
            return Err(Error::invalid(
                "rescale window",
                "reference curve is flat within the simulation window",
            ));
        }
        let span = scale_max - scale_min;
        let values = self
            .values
            .iter()
            .map(|v| base_min + ((v - scale_min) / span) * (base_max - base_min))
            // samples outside the window may exceed the band; clamp them in
            .map(|v| v.clamp(base_min, base_max))
            .collect();
        Self::new(self.index.clone(), values)
    }
}

/// Synthesizes a daily-shaped reference curve on a 1-minute grid, spanning
/// `[start, end]` and oscillating inside `[base_min, base_max]`.
///
/// Stands in for a measured system load when none is supplied.
pub fn synthetic_daily(
    start: NaiveDateTime,
    end: NaiveDateTime,
    base_min: f64,
    base_max: f64,
) -> Result<RefCurve> {
    if base_max <= base_min || base_min < 0.0 {
        return Err(Error::invalid(
            "base band",
            "requires 0 <= base_min < base_max",
        ));
    }
    let index = TimeIndex::regular(start, end, output_step())?;
    let mid = (base_max + base_min) / 2.0;
    let amp = (base_max - base_min) / 2.0;
    let values = index
        .stamps()
        .iter()
        .map(|t| {
            let minutes = (*t - start).num_minutes() as f64;
            let day_pos = (minutes % 1440.0) / 1440.0;
            // evening-peaked daily shape
            let angle = 2.0 * std::f64::consts::PI * day_pos + 1.2;
            mid + amp * angle.sin()
        })
        .collect();
    RefCurve::new(index, values)
}
