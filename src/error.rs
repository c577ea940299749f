//! Crate-wide error taxonomy.
//!
//! Configuration validation uses the field-path style in [`crate::config`];
//! everything the engine itself can raise lives here.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Faults raised by the load-synthesis engine.
#[derive(Debug, Error)]
pub enum Error {
    /// A distribution or structural parameter is outside its valid range.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: String,
    },

    /// The reference curve has no value at or before a required timestamp.
    #[error("reference curve has no value at or before {at}")]
    CurveCoverage { at: NaiveDateTime },

    /// The reference curve does not span the required simulation window.
    #[error("reference curve spans {curve_from}..{curve_to} but the run requires {from}..{to}")]
    CurveWindow {
        curve_from: NaiveDateTime,
        curve_to: NaiveDateTime,
        from: NaiveDateTime,
        to: NaiveDateTime,
    },

    /// Expected power times expected duration came out zero, so no arrival
    /// rate can be derived from the population.
    #[error("arrival rate denominator is zero (expected power x expected duration)")]
    RateDenominatorZero,

    /// The derived arrival rate is not a positive finite number.
    #[error("arrival rate {rate} at {at} is not positive and finite")]
    NonPositiveRate { rate: f64, at: NaiveDateTime },

    /// A stochastic draw produced a non-finite value. Should not occur with
    /// validated parameters.
    #[error("sampled a non-finite value for {quantity}")]
    Generation { quantity: &'static str },

    /// Malformed input data (curve or archetype table rows).
    #[error("malformed input data: {0}")]
    Data(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl Error {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
