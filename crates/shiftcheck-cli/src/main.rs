use clap::Parser as ClapParser;
use miette::{IntoDiagnostic, Result};
use shiftcheck_cli::{
    FileConfig, ModeArg, Overrides, ScenarioArg, TimingArg, run, select_scenario,
};
use std::path::PathBuf;

#[derive(ClapParser)]
#[command(
    name = "shiftcheck",
    version,
    about = "Run a shift-register scenario against the reference model"
)]
struct Cli {
    /// TOML file with a [harness] table and an optional [scenario] table
    #[arg(long)]
    config: Option<PathBuf>,

    /// Register depth (SR_LEN) the reference model assumes
    #[arg(long)]
    depth: Option<usize>,

    /// What counts as a shift event
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// When the strobe bit is flipped in toggle mode
    #[arg(long, value_enum)]
    timing: Option<TimingArg>,

    /// Clock period in ticks
    #[arg(long)]
    period: Option<u64>,

    /// Ticks between a shift event and the output sample
    #[arg(long)]
    settle: Option<u64>,

    /// How long reset stays asserted, in ticks
    #[arg(long)]
    reset_ticks: Option<u64>,

    /// Built-in scenario; overrides a [scenario] table from the config file
    #[arg(long, value_enum)]
    scenario: Option<ScenarioArg>,

    /// Number of ones injected by the pulse scenario
    #[arg(long)]
    pulse_len: Option<u64>,

    /// SR_LEN of the simulated unit under test (defaults to the model depth)
    #[arg(long)]
    uut_depth: Option<usize>,

    /// Print the report as JSON to stdout
    #[arg(long)]
    json: bool,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let overrides = Overrides {
        depth: cli.depth,
        mode: cli.mode,
        timing: cli.timing,
        period: cli.period,
        settle: cli.settle,
        reset_ticks: cli.reset_ticks,
    };
    let harness = overrides.apply(file.harness);
    let scenario = select_scenario(file.scenario, cli.scenario, harness.depth, cli.pulse_len)
        .into_diagnostic()?;

    let report = run(harness, &scenario, cli.uut_depth)?;
    if cli.json {
        let json = serde_json::to_string_pretty(&report).into_diagnostic()?;
        println!("{json}");
    }
    eprintln!("PASS {report}");
    Ok(())
}
