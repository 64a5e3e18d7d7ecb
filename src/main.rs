use anyhow::{Context, Result};
use clap::Parser;
use meanbench::{Lanes, Summation, config::Config, manager::Manager};
use std::{io, path::PathBuf};

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    /// TOML file with benchmark settings; flags below take precedence.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of samples.
    #[arg(long)]
    len: Option<usize>,

    /// Lower bound of the sample range.
    #[arg(long, allow_negative_numbers = true)]
    low: Option<f64>,

    /// Upper bound (exclusive) of the sample range.
    #[arg(long, allow_negative_numbers = true)]
    high: Option<f64>,

    /// Generator seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Order in which the samples are added up.
    #[arg(long, value_enum)]
    summation: Option<Summation>,

    /// Lane count of the unrolled summation (power of two up to 64).
    #[arg(long)]
    lanes: Option<usize>,

    /// Allocate the sample buffer on a 64-byte boundary.
    #[arg(long)]
    aligned: bool,

    /// Print only the average, without phase timings.
    #[arg(long)]
    no_timing: bool,

    /// Number of repeated runs.
    #[arg(long)]
    runs: Option<usize>,

    /// Average one buffer with every summation strategy.
    #[arg(long)]
    compare: bool,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        // The fatal message must reach stderr even when RUST_LOG filters it out.
        if log::log_enabled!(log::Level::Error) {
            log::error!("{error:?}");
        } else {
            eprintln!("{error:#}");
        }
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let cfg = build_config(&args).context("failed to construct cfg")?;
    let mgr = Manager::new(cfg).context("failed to construct mgr")?;

    let stdout = io::stdout();
    mgr.run_benchmark(&mut stdout.lock())
        .context("failed to run benchmark")?;

    Ok(())
}

fn build_config(args: &CLI) -> Result<Config> {
    let mut cfg = match &args.config {
        Some(file) => Config::from_file(file)?,
        None => Config::default(),
    };

    if let Some(len) = args.len {
        cfg.sample.len = len;
    }
    if let Some(low) = args.low {
        cfg.sample.low = low;
    }
    if let Some(high) = args.high {
        cfg.sample.high = high;
    }
    if args.seed.is_some() {
        cfg.sample.seed = args.seed;
    }
    if args.aligned {
        cfg.sample.aligned = true;
    }
    if let Some(summation) = args.summation {
        cfg.summation.method = summation;
    }
    if let Some(lanes) = args.lanes {
        cfg.summation.lanes = Lanes::try_from(lanes).context("invalid lane count")?;
    }
    if args.no_timing {
        cfg.output.timing = false;
    }
    if let Some(runs) = args.runs {
        cfg.output.runs = runs;
    }
    if args.compare {
        cfg.output.compare = true;
    }

    Ok(cfg)
}
