//! The immutable record emitted for every scheduled appliance run.

use std::fmt;

use chrono::{NaiveDateTime, TimeDelta};

use crate::appliance::ZipCoefficients;

/// One scheduled appliance instance in a home's event log.
///
/// `start` is snapped to the output grid via as-of lookup and `duration` is
/// the grid span actually aggregated, so the aggregated series at any grid
/// stamp equals the sum of `power_w` over events covering it, exactly.
#[derive(Debug, Clone)]
pub struct LoadEvent {
    pub start: NaiveDateTime,
    pub duration: TimeDelta,
    pub power_w: f64,
    pub schedulable: bool,
    /// Shifting window before the natural start, rounded to 1 minute.
    pub window_before: TimeDelta,
    /// Shifting window after the natural start, rounded to 1 minute.
    pub window_after: TimeDelta,
    pub reactive_var: f64,
    pub zip: ZipCoefficients,
    /// Ordinal of the source appliance within its regime population.
    pub appliance_index: usize,
}

impl LoadEvent {
    /// Whether the half-open interval `[start, start + duration)` covers `t`.
    pub fn covers(&self, t: NaiveDateTime) -> bool {
        t >= self.start && t < self.start + self.duration
    }

    /// Exclusive end of the event interval.
    pub fn end(&self) -> NaiveDateTime {
        self.start + self.duration
    }
}

/// Rounds a delta to the nearest whole minute.
pub fn round_to_minute(d: TimeDelta) -> TimeDelta {
    let ms = d.num_milliseconds();
    TimeDelta::minutes((ms + 30_000).div_euclid(60_000))
}

impl fmt::Display for LoadEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} +{:>4}min | {:>8.1} W {:>8.1} VAR | app #{:<3} sched={}",
            self.start,
            self.duration.num_minutes(),
            self.power_w,
            self.reactive_var,
            self.appliance_index,
            self.schedulable,
        )
    }
}
