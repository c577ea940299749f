//! Fleet runner: builds the shared simulation context and fans home runs
//! out across a thread pool.

use chrono::NaiveDateTime;
use rayon::prelude::*;
use tracing::info;

use crate::appliance::{ArchetypeTable, PopulationParams};
use crate::config::ScenarioConfig;
use crate::error::{Error, Result};
use crate::season::{Hemisphere, SeasonWeights};
use crate::series::RefCurve;
use crate::sim::arrival::lookahead_margin;
use crate::sim::driver::{HomeResult, run_home};
use crate::sim::schedule::Envelope;

/// Read-only inputs shared by every home run.
///
/// Built once from a validated [`ScenarioConfig`] plus the prepared
/// reference curve and archetype table, then borrowed by each worker.
#[derive(Debug)]
pub struct SimContext {
    /// Reference curve on the 1-minute output grid, covering the horizon
    /// plus the arrival lookahead margin.
    pub curve: RefCurve,
    /// Capacity ceiling, `None` for the unconstrained queue.
    pub envelope: Option<Envelope>,
    /// Appliance archetype rows.
    pub archetypes: ArchetypeTable,
    /// Per-regime archetype draw weights.
    pub weights: SeasonWeights,
    /// Population moment parameters.
    pub population: PopulationParams,
    /// Horizon start (inclusive).
    pub start: NaiveDateTime,
    /// Horizon end (inclusive).
    pub end: NaiveDateTime,
    /// Hard rejection instead of boundary fallback when capacity runs out.
    pub strict: bool,
    pub hemisphere: Hemisphere,
    /// Master seed; each home folds its id into this.
    pub seed: u64,
}

impl SimContext {
    /// Assembles the shared context, checking every cross-input invariant.
    ///
    /// # Errors
    ///
    /// Fails if the horizon is empty or reversed, the curve does not cover
    /// the horizon plus the lookahead margin, the population parameters are
    /// out of range, or the capacity envelope cannot be built.
    pub fn new(
        cfg: &ScenarioConfig,
        curve: RefCurve,
        archetypes: ArchetypeTable,
        weights: SeasonWeights,
    ) -> Result<Self> {
        let start = cfg.start_time()?;
        let end = cfg.end_time()?;
        if start >= end {
            return Err(Error::invalid("simulation window", "end must be after start"));
        }
        let needed_to = end + lookahead_margin();
        if !curve.covers(start, needed_to) {
            return Err(Error::CurveWindow {
                curve_from: curve.index().first(),
                curve_to: curve.index().last(),
                from: start,
                to: needed_to,
            });
        }

        let population = cfg.population_params();
        population.validate()?;

        if weights.spring.len() != archetypes.len() {
            return Err(Error::invalid(
                "archetype weights",
                "weight rows must match the archetype table length",
            ));
        }

        let envelope = Envelope::build(
            cfg.queue_kind()?,
            &curve,
            cfg.queue.capacity_multiple,
            start,
            end,
        )?;

        Ok(Self {
            curve,
            envelope,
            archetypes,
            weights,
            population,
            start,
            end,
            strict: cfg.queue.strict,
            hemisphere: cfg.hemisphere()?,
            seed: cfg.simulation.seed,
        })
    }
}

/// Runs every home in parallel and returns results in input order.
///
/// Each home is independent: it derives its own RNG stream from the master
/// seed, so the output is identical whatever the worker count.
pub fn run_homes(ctx: &SimContext, home_ids: &[String]) -> Vec<Result<HomeResult>> {
    info!(homes = home_ids.len(), seed = ctx.seed, "starting fleet run");
    home_ids
        .par_iter()
        .map(|id| run_home(ctx, id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn context_for(cfg: &ScenarioConfig) -> Result<SimContext> {
        let curve = RefCurve::constant(
            dt("2014-01-01 00:00:00"),
            dt("2014-01-05 00:00:00"),
            2550.0,
        )?;
        let archetypes = ArchetypeTable::demo();
        let weights = SeasonWeights::uniform(archetypes.len());
        SimContext::new(cfg, curve, archetypes, weights)
    }

    #[test]
    fn baseline_context_builds() {
        let cfg = ScenarioConfig::baseline();
        let ctx = context_for(&cfg).unwrap();
        assert!(ctx.envelope.is_none());
        assert_eq!(ctx.seed, 42);
    }

    #[test]
    fn constrained_context_has_envelope() {
        let cfg = ScenarioConfig::constrained();
        let ctx = context_for(&cfg).unwrap();
        assert!(ctx.envelope.is_some());
    }

    #[test]
    fn short_curve_is_rejected() {
        let cfg = ScenarioConfig::baseline();
        // ends exactly at the horizon end, so the lookahead margin is missing
        let curve = RefCurve::constant(
            dt("2014-01-01 00:00:00"),
            dt("2014-01-03 00:00:00"),
            2550.0,
        )
        .unwrap();
        let archetypes = ArchetypeTable::demo();
        let weights = SeasonWeights::uniform(archetypes.len());
        let err = SimContext::new(&cfg, curve, archetypes, weights).unwrap_err();
        assert!(matches!(err, Error::CurveWindow { .. }));
    }

    #[test]
    fn mismatched_weights_are_rejected() {
        let cfg = ScenarioConfig::baseline();
        let curve = RefCurve::constant(
            dt("2014-01-01 00:00:00"),
            dt("2014-01-05 00:00:00"),
            2550.0,
        )
        .unwrap();
        let archetypes = ArchetypeTable::demo();
        let weights = SeasonWeights::uniform(archetypes.len() + 1);
        assert!(SimContext::new(&cfg, curve, archetypes, weights).is_err());
    }

    #[test]
    fn run_homes_preserves_input_order() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.end = "2014-01-01 06:00:00".to_string();
        cfg.population.size = 20;
        let ctx = context_for(&cfg).unwrap();
        let ids: Vec<String> = vec!["1".into(), "2".into(), "3".into()];
        let results = run_homes(&ctx, &ids);
        assert_eq!(results.len(), 3);
        for (id, result) in ids.iter().zip(&results) {
            assert_eq!(&result.as_ref().unwrap().home_id, id);
        }
    }
}
