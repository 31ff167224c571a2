use std::path::PathBuf;

use clap::Parser;

use locsim::logging;
use locsim::{
    BeaconLoc, LocApplModule, ModuleRegistry, ScenarioConfig, SimResult, SimTime, Simulation,
};

const DEFAULT_SCENARIO: &str = include_str!("../scenarios/anchors.toml");

#[derive(Debug, Parser)]
#[command(name = "locsim", about = "Run a localization scenario on the event kernel")]
struct Cli {
    /// Scenario TOML file. Runs the bundled anchors scenario when omitted.
    scenario: Option<PathBuf>,

    /// Stop after the last event at or before this tick.
    #[arg(long)]
    until: Option<u64>,

    /// Stop after this many events.
    #[arg(long)]
    max_events: Option<u64>,

    /// Print the dispatch trace as JSON after the run.
    #[arg(long)]
    trace_json: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);

    if let Err(e) = run(&cli) {
        tracing::error!(error = %e, "simulation failed");
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> SimResult<()> {
    let config = match &cli.scenario {
        Some(path) => ScenarioConfig::from_file(path)?,
        None => ScenarioConfig::from_toml_str(DEFAULT_SCENARIO)?,
    };
    let label = config.simulation.name.clone().unwrap_or_else(|| "scenario".into());

    let mut sim = Simulation::from_scenario(&config, &ModuleRegistry::with_builtins())?;
    sim.initialize()?;

    let until = cli.until.or(config.simulation.until);
    let max_events = cli.max_events.or(config.simulation.max_events);
    let processed = match (until, max_events) {
        (Some(t), Some(n)) => sim.run_bounded(SimTime::new(t), n)?,
        (None, Some(n)) => sim.run_for(n)?,
        (Some(t), None) => sim.run_until(SimTime::new(t))?,
        (None, None) => sim.run()?,
    };
    sim.finish();

    println!("{}: {} events, ended at {}", label, processed, sim.current_time());
    for module in &config.modules {
        let Some(loc) = sim.module_by_name::<LocApplModule<BeaconLoc>>(&module.name) else {
            continue;
        };
        let algo = loc.algorithm();
        let role = if algo.is_anchor() { "anchor" } else { "node" };
        let position = algo
            .position()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "unknown".into());
        println!(
            "  {:<10} {:<6} position={:<16} beacons_sent={} anchors_heard={}",
            module.name,
            role,
            position,
            algo.beacons_sent,
            algo.anchors.len()
        );
    }

    if cli.trace_json {
        println!("{}", sim.trace_json()?);
    }
    Ok(())
}
