//! Shared test fixtures for integration tests.

use chrono::NaiveDateTime;

use zipload_sim::appliance::ArchetypeTable;
use zipload_sim::config::ScenarioConfig;
use zipload_sim::runner::SimContext;
use zipload_sim::season::SeasonWeights;
use zipload_sim::series::RefCurve;

/// Parses a `YYYY-mm-dd HH:MM:SS` timestamp.
pub fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

/// Default 48-hour scenario (2014-01-01 through 2014-01-03, seed 42) with
/// a smaller population to keep run times short.
pub fn default_scenario() -> ScenarioConfig {
    let mut cfg = ScenarioConfig::baseline();
    cfg.population.size = 50;
    cfg
}

/// Flat reference curve at 2550 W covering the default scenario horizon
/// plus the arrival lookahead.
pub fn flat_curve() -> RefCurve {
    RefCurve::constant(dt("2014-01-01 00:00:00"), dt("2014-01-05 00:00:00"), 2550.0).unwrap()
}

/// Builds the shared context from a scenario, using the flat curve, the
/// built-in demo archetype table, and uniform seasonal weights.
pub fn default_context(cfg: &ScenarioConfig) -> SimContext {
    let archetypes = ArchetypeTable::demo();
    let weights = SeasonWeights::uniform(archetypes.len());
    SimContext::new(cfg, flat_curve(), archetypes, weights).unwrap()
}
