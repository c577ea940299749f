//! Load-synthesis entry point — CLI wiring and scenario-driven fleet runs.

use std::path::{Path, PathBuf};
use std::process;

use tracing_subscriber::EnvFilter;

use zipload_sim::appliance::ArchetypeTable;
use zipload_sim::config::ScenarioConfig;
use zipload_sim::io::{export_home, load_archetypes_csv, load_curve_csv, load_weights_csv, prepare_reference};
use zipload_sim::runner::{SimContext, run_homes};
use zipload_sim::season::SeasonWeights;
use zipload_sim::series::{RefCurve, synthetic_daily};
use zipload_sim::sim::arrival::lookahead_margin;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    homes_override: Option<usize>,
    curve_path: Option<String>,
    archetypes_path: Option<String>,
    weights_path: Option<String>,
    out_dir: PathBuf,
}

fn print_help() {
    eprintln!("zipload-sim — bottom-up residential load synthesis");
    eprintln!();
    eprintln!("Usage: zipload-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>     Load scenario from TOML config file");
    eprintln!("  --preset <name>       Use a built-in preset (baseline, constrained, strict)");
    eprintln!("  --seed <u64>          Override random seed");
    eprintln!("  --homes <n>           Override home count");
    eprintln!("  --curve <path>        Reference curve CSV (timestamp,load)");
    eprintln!("  --archetypes <path>   Archetype table CSV (name,po,qo,zp,ip,pp,zq,iq,pq)");
    eprintln!("  --weights <path>      Seasonal weights CSV (archetype,spring,summer,winter)");
    eprintln!("  --out <dir>           Output directory for per-home CSVs (default: .)");
    eprintln!("  --help                Show this help message");
    eprintln!();
    eprintln!("Without --curve a synthetic daily-shaped reference is used; without");
    eprintln!("--archetypes a built-in demo table is used.");
}

fn required_value(args: &[String], i: usize, flag: &str) -> String {
    if i >= args.len() {
        eprintln!("error: {flag} requires an argument");
        process::exit(1);
    }
    args[i].clone()
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        seed_override: None,
        homes_override: None,
        curve_path: None,
        archetypes_path: None,
        weights_path: None,
        out_dir: PathBuf::from("."),
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                cli.scenario_path = Some(required_value(&args, i, "--scenario"));
            }
            "--preset" => {
                i += 1;
                cli.preset = Some(required_value(&args, i, "--preset"));
            }
            "--seed" => {
                i += 1;
                let raw = required_value(&args, i, "--seed");
                match raw.parse::<u64>() {
                    Ok(s) => cli.seed_override = Some(s),
                    Err(_) => {
                        eprintln!("error: --seed value \"{raw}\" is not a valid u64");
                        process::exit(1);
                    }
                }
            }
            "--homes" => {
                i += 1;
                let raw = required_value(&args, i, "--homes");
                match raw.parse::<usize>() {
                    Ok(n) if n > 0 => cli.homes_override = Some(n),
                    _ => {
                        eprintln!("error: --homes value \"{raw}\" is not a positive integer");
                        process::exit(1);
                    }
                }
            }
            "--curve" => {
                i += 1;
                cli.curve_path = Some(required_value(&args, i, "--curve"));
            }
            "--archetypes" => {
                i += 1;
                cli.archetypes_path = Some(required_value(&args, i, "--archetypes"));
            }
            "--weights" => {
                i += 1;
                cli.weights_path = Some(required_value(&args, i, "--weights"));
            }
            "--out" => {
                i += 1;
                cli.out_dir = PathBuf::from(required_value(&args, i, "--out"));
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn load_scenario(cli: &CliArgs) -> ScenarioConfig {
    let mut scenario = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ScenarioConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ScenarioConfig::baseline()
    };

    if let Some(seed) = cli.seed_override {
        scenario.simulation.seed = seed;
    }
    if let Some(homes) = cli.homes_override {
        scenario.simulation.homes = homes;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    scenario
}

fn build_curve(cli: &CliArgs, cfg: &ScenarioConfig) -> zipload_sim::Result<RefCurve> {
    let start = cfg.start_time()?;
    let end = cfg.end_time()?;
    if let Some(ref path) = cli.curve_path {
        let raw = load_curve_csv(Path::new(path))?;
        prepare_reference(&raw, start, end, cfg.curve.base_min_w, cfg.curve.base_max_w)
    } else {
        synthetic_daily(
            start,
            end + lookahead_margin(),
            cfg.curve.base_min_w,
            cfg.curve.base_max_w,
        )
    }
}

fn run(cli: &CliArgs, scenario: &ScenarioConfig) -> zipload_sim::Result<()> {
    let curve = build_curve(cli, scenario)?;

    let archetypes = match cli.archetypes_path {
        Some(ref path) => load_archetypes_csv(Path::new(path))?,
        None => ArchetypeTable::demo(),
    };
    let weights = match cli.weights_path {
        Some(ref path) => load_weights_csv(Path::new(path), &archetypes)?,
        None => SeasonWeights::uniform(archetypes.len()),
    };

    let ctx = SimContext::new(scenario, curve, archetypes, weights)?;
    let home_ids = scenario.home_ids();
    let results = run_homes(&ctx, &home_ids);

    std::fs::create_dir_all(&cli.out_dir)?;
    let mut failures = 0usize;
    for result in results {
        match result {
            Ok(home) => {
                export_home(&home, &cli.out_dir)?;
                println!(
                    "home {}: {} events, {:.1} kWh, deferred {}, rejected {}",
                    home.home_id,
                    home.events.len(),
                    home.series.total_energy_wh() / 1000.0,
                    home.deferred,
                    home.rejected,
                );
            }
            Err(e) => {
                eprintln!("error: home run failed: {e}");
                failures += 1;
            }
        }
    }
    if failures > 0 {
        eprintln!("error: {failures} home run(s) failed");
        process::exit(1);
    }
    eprintln!(
        "Per-home event logs and series written to {}",
        cli.out_dir.display()
    );
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = parse_args();
    let scenario = load_scenario(&cli);

    if let Err(e) = run(&cli, &scenario) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
