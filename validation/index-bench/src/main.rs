//! Benchmark CLI for containing-cell indexes and read strategies.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use index_bench::{run_scenario, tune_kdtree, ResultsReport, Scenario};

#[derive(Parser)]
#[command(name = "index-bench")]
#[command(about = "Compare spatial index variants and read strategies on synthetic grids", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a benchmark scenario
    Run {
        /// Path to scenario YAML file
        #[arg(short, long)]
        scenario: PathBuf,

        /// Override the number of query points
        #[arg(short, long)]
        queries: Option<usize>,

        /// Output format: table (default), json
        #[arg(short, long, default_value = "table")]
        output: String,
    },

    /// Sweep KD-tree k and expansion factor against the priority R-tree
    Tune {
        /// Path to scenario YAML file
        #[arg(short, long)]
        scenario: PathBuf,

        /// Candidate counts to try
        #[arg(short, long, value_delimiter = ',', default_value = "1,4,8,16")]
        k: Vec<usize>,

        /// Radius expansion factors to try
        #[arg(short, long, value_delimiter = ',', default_value = "1.5,2.0,3.5")]
        expansion: Vec<f64>,

        /// Output format: table (default), json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);
    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn load_scenario(path: &PathBuf) -> Result<Scenario> {
    let scenario = Scenario::from_file(path)?;
    scenario.validate()?;
    info!(name = %scenario.name, path = %path.display(), "Loaded scenario");
    Ok(scenario)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs)?;

    match cli.command {
        Commands::Run {
            scenario,
            queries,
            output,
        } => {
            let mut scenario = load_scenario(&scenario)?;
            if let Some(q) = queries {
                scenario.queries = q;
            }
            scenario.validate()?;

            let results = run_scenario(&scenario)?;
            match output.as_str() {
                "json" => println!("{}", ResultsReport::format_json(&results)?),
                _ => println!("{}", ResultsReport::format_table(&results)),
            }
        }
        Commands::Tune {
            scenario,
            k,
            expansion,
            output,
        } => {
            let scenario = load_scenario(&scenario)?;
            let results = tune_kdtree(&scenario, &k, &expansion)?;
            match output.as_str() {
                "json" => println!("{}", ResultsReport::format_json(&results)?),
                _ => println!("{}", ResultsReport::format_tune_table(&results)),
            }
        }
    }

    Ok(())
}
