//! Start-time placement policies: immediate, or earliest admissible start
//! under a capacity envelope.

use chrono::{NaiveDateTime, TimeDelta};

use crate::error::{Error, Result};
use crate::series::{RefCurve, TimeIndex, output_step};
use crate::sim::aggregate::Aggregator;

/// How far past the arrival the constrained search may push a start.
pub const SEARCH_WINDOW_HOURS: i64 = 22;

/// Queueing variant selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    /// Infinite capacity: every appliance starts at its arrival time.
    Unconstrained,
    /// Constant ceiling: a multiple of the reference peak inside the window.
    ConstantCapacity,
    /// Time-varying ceiling: the reference curve times the multiple.
    CurveCapacity,
}

/// A capacity ceiling evaluated over the full reference grid.
#[derive(Debug, Clone)]
pub struct Envelope {
    values: Vec<f64>,
}

impl Envelope {
    /// Builds the envelope for the configured queue kind, or `None` for the
    /// unconstrained variant.
    ///
    /// # Errors
    ///
    /// A non-positive multiple is a configuration fault, as is a window with
    /// no curve samples to take the peak from.
    pub fn build(
        kind: QueueKind,
        curve: &RefCurve,
        multiple: f64,
        window_from: NaiveDateTime,
        window_to: NaiveDateTime,
    ) -> Result<Option<Self>> {
        if kind == QueueKind::Unconstrained {
            return Ok(None);
        }
        if !(multiple.is_finite() && multiple > 0.0) {
            return Err(Error::invalid("capacity multiple", "must be > 0"));
        }
        let values = match kind {
            QueueKind::Unconstrained => unreachable!(),
            QueueKind::ConstantCapacity => {
                let peak = curve
                    .peak_within(window_from, window_to)
                    .ok_or_else(|| {
                        Error::invalid(
                            "capacity envelope",
                            "no curve samples inside the simulation window",
                        )
                    })?;
                vec![peak * multiple; curve.index().len()]
            }
            QueueKind::CurveCapacity => curve.values().iter().map(|v| v * multiple).collect(),
        };
        Ok(Some(Self { values }))
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Outcome of one placement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placed {
    At {
        /// Grid position of the chosen start.
        start_idx: usize,
        /// Set when the search exhausted its window and fell back to the
        /// boundary (soft constraint) rather than finding an admissible slot.
        deferred: bool,
    },
    /// Strict mode only: no admissible slot, appliance dropped.
    Rejected,
}

/// Decides start times for drawn appliances.
pub struct Scheduler<'a> {
    envelope: Option<&'a Envelope>,
    strict: bool,
    window_steps: usize,
}

impl<'a> Scheduler<'a> {
    pub fn new(envelope: Option<&'a Envelope>, strict: bool) -> Self {
        let step_minutes = output_step().num_minutes().max(1);
        Self {
            envelope,
            strict,
            window_steps: (SEARCH_WINDOW_HOURS * 60 / step_minutes) as usize,
        }
    }

    /// Finds the start position for an appliance arriving at grid position
    /// `arrival_idx` with the given duration and power.
    ///
    /// Unconstrained placement is immediate. Constrained placement walks
    /// candidate starts one grid step at a time, accepting the first whose
    /// whole duration interval keeps the aggregate strictly under the
    /// envelope; on exhaustion it accepts the window boundary (or rejects,
    /// in strict mode).
    pub fn place(
        &self,
        grid: &TimeIndex,
        agg: &Aggregator,
        arrival_idx: usize,
        duration: TimeDelta,
        power_w: f64,
    ) -> Placed {
        let Some(envelope) = self.envelope else {
            return Placed::At {
                start_idx: arrival_idx,
                deferred: false,
            };
        };

        let last = grid.len() - 1;
        let env = envelope.values();
        let active = agg.active_w();
        let boundary = (arrival_idx + self.window_steps).min(last);

        for cand in arrival_idx..=boundary {
            let end_stamp = grid.stamp(cand) + duration;
            let end_idx = grid.lower_bound(end_stamp).min(grid.len());
            let admissible = (cand..end_idx).all(|i| active[i] + power_w < env[i]);
            if admissible {
                return Placed::At {
                    start_idx: cand,
                    deferred: false,
                };
            }
        }

        if self.strict {
            Placed::Rejected
        } else {
            Placed::At {
                start_idx: boundary,
                deferred: true,
            }
        }
    }
}
