//! TOML-based scenario configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::appliance::PopulationParams;
use crate::error::{Error, Result};
use crate::season::Hemisphere;
use crate::sim::QueueKind;

/// Timestamp format used in scenario files.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from TOML
/// with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Simulation horizon and global parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Queueing/scheduling policy parameters.
    #[serde(default)]
    pub queue: QueueConfig,
    /// Appliance population generation parameters.
    #[serde(default)]
    pub population: PopulationConfig,
    /// Reference-curve rescaling band.
    #[serde(default)]
    pub curve: CurveConfig,
}

/// Simulation horizon and global parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Horizon start, `YYYY-mm-dd HH:MM:SS`.
    pub start: String,
    /// Horizon end, `YYYY-mm-dd HH:MM:SS` (must be after `start`).
    pub end: String,
    /// Master random seed; each home derives its own stream from it.
    pub seed: u64,
    /// Number of homes to generate.
    pub homes: usize,
    /// `"north"` or `"south"`.
    pub hemisphere: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start: "2014-01-01 00:00:00".to_string(),
            end: "2014-01-03 00:00:00".to_string(),
            seed: 42,
            homes: 4,
            hemisphere: "north".to_string(),
        }
    }
}

/// Queueing/scheduling policy parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueConfig {
    /// Queue type: `"unconstrained"`, `"constant-capacity"`, or
    /// `"curve-capacity"`.
    pub kind: String,
    /// Capacity envelope multiple (e.g. 2.0 = 200% of the reference).
    pub capacity_multiple: f64,
    /// Hard rejection instead of the soft window-boundary fallback.
    pub strict: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            kind: "unconstrained".to_string(),
            capacity_multiple: 2.0,
            strict: false,
        }
    }
}

/// Appliance population generation parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PopulationConfig {
    /// Appliance set size per regime.
    pub size: usize,
    /// Fraction of schedulable appliances (0.5 = 50%).
    pub schedulable_fraction: f64,
    /// Mean power rating (W).
    pub power_mean_w: f64,
    /// Power rating standard deviation (W).
    pub power_std_w: f64,
    /// Mean run duration (hours).
    pub duration_mean_h: f64,
    /// Run duration standard deviation (hours).
    pub duration_std_h: f64,
    /// Mean shifting-window width (hours).
    pub window_mean_h: f64,
    /// Shifting-window width standard deviation (hours).
    pub window_std_h: f64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: 100,
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

/// Reference-curve rescaling band.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CurveConfig {
    /// Lower bound of the rescaled reference (W).
    pub base_min_w: f64,
    /// Upper bound of the rescaled reference (W).
    pub base_max_w: f64,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            base_min_w: 100.0,
            base_max_w: 5000.0,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g. `"queue.capacity_multiple"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

fn parse_time(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIME_FORMAT).map_err(|e| Error::InvalidParameter {
        name: "timestamp",
        reason: format!("\"{s}\" does not match {TIME_FORMAT}: {e}"),
    })
}

impl ScenarioConfig {
    /// Returns the baseline scenario: two days, unconstrained queue,
    /// 100-appliance populations.
    pub fn baseline() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            queue: QueueConfig::default(),
            population: PopulationConfig::default(),
            curve: CurveConfig::default(),
        }
    }

    /// Returns the constrained preset: curve-proportional capacity at 200%.
    pub fn constrained() -> Self {
        Self {
            queue: QueueConfig {
                kind: "curve-capacity".to_string(),
                capacity_multiple: 2.0,
                strict: false,
            },
            ..Self::baseline()
        }
    }

    /// Returns the strict preset: constant capacity with hard rejection.
    pub fn strict() -> Self {
        Self {
            queue: QueueConfig {
                kind: "constant-capacity".to_string(),
                capacity_multiple: 1.5,
                strict: true,
            },
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &'static [&'static str] = &["baseline", "constrained", "strict"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> std::result::Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "constrained" => Ok(Self::constrained()),
            "strict" => Ok(Self::strict()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> std::result::Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "scenario".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> std::result::Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.simulation;

        let start = parse_time(&s.start);
        let end = parse_time(&s.end);
        if start.is_err() {
            errors.push(ConfigError {
                field: "simulation.start".into(),
                message: format!("must match \"{TIME_FORMAT}\""),
            });
        }
        if end.is_err() {
            errors.push(ConfigError {
                field: "simulation.end".into(),
                message: format!("must match \"{TIME_FORMAT}\""),
            });
        }
        if let (Ok(a), Ok(b)) = (start, end)
            && a >= b
        {
            errors.push(ConfigError {
                field: "simulation.end".into(),
                message: "must be after simulation.start".into(),
            });
        }
        if s.homes == 0 {
            errors.push(ConfigError {
                field: "simulation.homes".into(),
                message: "must be > 0".into(),
            });
        }
        if Hemisphere::parse(&s.hemisphere).is_err() {
            errors.push(ConfigError {
                field: "simulation.hemisphere".into(),
                message: format!("must be \"north\" or \"south\", got \"{}\"", s.hemisphere),
            });
        }

        let q = &self.queue;
        let known_kind = matches!(
            q.kind.as_str(),
            "unconstrained" | "constant-capacity" | "curve-capacity"
        );
        if !known_kind {
            errors.push(ConfigError {
                field: "queue.kind".into(),
                message: format!(
                    "must be \"unconstrained\", \"constant-capacity\", or \"curve-capacity\", got \"{}\"",
                    q.kind
                ),
            });
        }
        if known_kind && q.kind != "unconstrained" && q.capacity_multiple <= 0.0 {
            errors.push(ConfigError {
                field: "queue.capacity_multiple".into(),
                message: "must be > 0".into(),
            });
        }

        let p = &self.population;
        if p.size == 0 {
            errors.push(ConfigError {
                field: "population.size".into(),
                message: "must be > 0".into(),
            });
        }
        if !(0.0..=1.0).contains(&p.schedulable_fraction) {
            errors.push(ConfigError {
                field: "population.schedulable_fraction".into(),
                message: "must be in [0.0, 1.0]".into(),
            });
        }
        for (field, value) in [
            ("population.power_mean_w", p.power_mean_w),
            ("population.power_std_w", p.power_std_w),
            ("population.duration_mean_h", p.duration_mean_h),
            ("population.duration_std_h", p.duration_std_h),
            ("population.window_mean_h", p.window_mean_h),
            ("population.window_std_h", p.window_std_h),
        ] {
            if !(value.is_finite() && value > 0.0) {
                errors.push(ConfigError {
                    field: field.into(),
                    message: "must be > 0".into(),
                });
            }
        }

        let c = &self.curve;
        if !(c.base_min_w.is_finite() && c.base_min_w > 0.0) {
            errors.push(ConfigError {
                field: "curve.base_min_w".into(),
                message: "must be > 0 (a zero floor makes the arrival rate vanish)".into(),
            });
        }
        if c.base_max_w <= c.base_min_w {
            errors.push(ConfigError {
                field: "curve.base_max_w".into(),
                message: "must be > curve.base_min_w".into(),
            });
        }

        errors
    }

    /// Parsed horizon start.
    pub fn start_time(&self) -> Result<NaiveDateTime> {
        parse_time(&self.simulation.start)
    }

    /// Parsed horizon end.
    pub fn end_time(&self) -> Result<NaiveDateTime> {
        parse_time(&self.simulation.end)
    }

    /// Parsed hemisphere.
    pub fn hemisphere(&self) -> Result<Hemisphere> {
        Hemisphere::parse(&self.simulation.hemisphere)
    }

    /// Parsed queue kind.
    pub fn queue_kind(&self) -> Result<QueueKind> {
        match self.queue.kind.as_str() {
            "unconstrained" => Ok(QueueKind::Unconstrained),
            "constant-capacity" => Ok(QueueKind::ConstantCapacity),
            "curve-capacity" => Ok(QueueKind::CurveCapacity),
            other => Err(Error::invalid(
                "queue.kind",
                format!("unknown queue kind \"{other}\""),
            )),
        }
    }

    /// Population parameters in engine form.
    pub fn population_params(&self) -> PopulationParams {
        let p = &self.population;
        PopulationParams {
            count: p.size,
            schedulable_fraction: p.schedulable_fraction,
            power_mean_w: p.power_mean_w,
            power_std_w: p.power_std_w,
            duration_mean_h: p.duration_mean_h,
            duration_std_h: p.duration_std_h,
            window_mean_h: p.window_mean_h,
            window_std_h: p.window_std_h,
        }
    }

    /// Home identifiers `"1"..="homes"`, the unit of work the runner maps over.
    pub fn home_ids(&self) -> Vec<String> {
        (1..=self.simulation.homes).map(|i| i.to_string()).collect()
    }
}
