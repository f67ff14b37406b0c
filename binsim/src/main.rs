use binsim::{bench_step, bench_step_curve, Engine, Scenario, ScenarioConfig};

use clap::Parser;
use anyhow::{Context, Result};

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser, Debug)]
struct Args {
    /// Scenario file, looked up in ./scenarios when not found as given
    #[arg(short, long = "file", default_value = "default.yaml")]
    file_name: String,

    /// Override the number of steps
    #[arg(long)]
    steps: Option<u64>,

    /// Override the worker count (1 = serial)
    #[arg(long)]
    threads: Option<usize>,

    /// Run the scaling benchmark instead of a scenario
    #[arg(long)]
    bench: bool,

    /// With --bench, print a CSV curve
    #[arg(long)]
    curve: bool,
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let given = PathBuf::from(file_name);
    let config_path = if given.exists() {
        given
    } else {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name)
    };
    let file = File::open(&config_path)
        .with_context(|| format!("opening scenario {}", config_path.display()))?;
    let reader = BufReader::new(file);
    let scenario_cfg = ScenarioConfig::from_reader(reader)
        .with_context(|| format!("parsing scenario {}", config_path.display()))?;

    log::debug!("{:?}", scenario_cfg);

    Ok(scenario_cfg)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.bench {
        let engine = Engine {
            threads: args.threads.unwrap_or(0),
        };
        if args.curve {
            bench_step_curve(&engine)?;
        } else {
            bench_step(&engine)?;
        }
        return Ok(());
    }

    let mut scenario_cfg = load_scenario_from_yaml(&args.file_name)?;
    if let Some(threads) = args.threads {
        scenario_cfg.engine.threads = threads;
    }
    let steps = args.steps.unwrap_or(scenario_cfg.run.steps);
    let report_every = scenario_cfg.run.report_every;

    let mut scenario = Scenario::build_scenario(scenario_cfg)?;
    log::info!(
        "running {} particles in a {:.4} x {:.4} domain on {} workers",
        scenario.system.len(),
        scenario.system.size,
        scenario.system.size,
        scenario.worker_count()
    );
    scenario.run(steps, report_every)?;

    Ok(())
}
