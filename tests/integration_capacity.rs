//! Integration tests for capacity-constrained scheduling queues.

mod common;

use zipload_sim::sim::driver::{HomeResult, run_home};

fn run_with_queue(kind: &str, multiple: f64, strict: bool) -> HomeResult {
    let mut cfg = common::default_scenario();
    cfg.queue.kind = kind.to_string();
    cfg.queue.capacity_multiple = multiple;
    cfg.queue.strict = strict;
    let ctx = common::default_context(&cfg);
    run_home(&ctx, "1").unwrap()
}

#[test]
fn generous_envelope_reduces_to_unconstrained() {
    // capacity far above any plausible concurrency never binds, and the
    // scheduler draws nothing from the RNG, so the runs are identical
    let unconstrained = run_with_queue("unconstrained", 0.0, false);
    let generous = run_with_queue("constant-capacity", 1000.0, false);
    assert_eq!(generous.deferred, 0);
    assert_eq!(generous.rejected, 0);
    assert_eq!(generous.events.len(), unconstrained.events.len());
    assert_eq!(generous.series.active_w, unconstrained.series.active_w);
}

#[test]
fn tight_envelope_defers_placements() {
    // 20% of a flat 2550 W reference is 510 W, below even two mean-rated
    // appliances running at once
    let result = run_with_queue("curve-capacity", 0.2, false);
    assert!(
        result.deferred > 0,
        "a 510 W ceiling should force boundary placements"
    );
    assert_eq!(result.rejected, 0, "soft mode never rejects");
}

#[test]
fn tight_envelope_series_still_matches_event_log() {
    let result = run_with_queue("curve-capacity", 0.2, false);
    let series = &result.series;
    for (i, stamp) in series.index.stamps().iter().enumerate() {
        let expected: f64 = result
            .events
            .iter()
            .filter(|e| e.covers(*stamp))
            .map(|e| e.power_w)
            .sum();
        assert!(
            (series.active_w[i] - expected).abs() < 1e-6,
            "series diverges from the event log at {stamp}"
        );
    }
}

#[test]
fn deferred_placements_stay_inside_the_horizon() {
    // starts may be pushed later but never earlier, and the driver drops
    // boundary placements that land past the horizon end
    let cfg = common::default_scenario();
    let start = common::dt(&cfg.simulation.start);
    let end = common::dt(&cfg.simulation.end);
    let result = run_with_queue("curve-capacity", 0.2, false);
    for e in &result.events {
        assert!(e.start >= start && e.start <= end);
    }
}

#[test]
fn strict_mode_rejects_instead_of_deferring() {
    let soft = run_with_queue("constant-capacity", 0.2, false);
    let strict = run_with_queue("constant-capacity", 0.2, true);
    assert!(strict.rejected > 0, "a binding ceiling should reject in strict mode");
    assert_eq!(strict.deferred, 0);
    assert!(
        strict.events.len() < soft.events.len(),
        "rejections should shrink the event log ({} vs {})",
        strict.events.len(),
        soft.events.len()
    );
}

#[test]
fn strict_mode_never_breaches_the_ceiling() {
    let result = run_with_queue("constant-capacity", 0.4, true);
    // flat reference peak is 2550 W, so the ceiling is 1020 W; every
    // admitted appliance fit under it at placement time
    let ceiling = 2550.0 * 0.4;
    for (i, v) in result.series.active_w.iter().enumerate() {
        assert!(
            *v <= ceiling + 1e-9,
            "active power {v} breaches the {ceiling} W ceiling at index {i}"
        );
    }
}
