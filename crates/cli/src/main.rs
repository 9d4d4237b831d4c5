//! MESS CLI - Multivariate environmental similarity surfaces

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use mess_algorithms::similarity::{run, MessConfig, MessParams, OutputSelection, DEFAULT_DIGITS};
use mess_core::DirectoryStore;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "mess")]
#[command(
    author,
    version,
    about = "Multivariate environmental similarity surfaces (Elith et al. 2010)",
    long_about = None
)]
struct Cli {
    /// Predictor layers, comma separated
    #[arg(long = "env-var", value_delimiter = ',', required = true)]
    env_var: Vec<String>,

    /// Base name of the output layers
    #[arg(long)]
    output: String,

    /// Reference raster; non-zero cells are reference cells
    #[arg(long = "ref-rast")]
    ref_rast: Option<String>,

    /// Reference point layer (CSV with x,y and optional id columns)
    #[arg(long = "ref-vect")]
    ref_vect: Option<String>,

    /// Rounding precision of reference values
    #[arg(long, default_value_t = DEFAULT_DIGITS)]
    digits: f64,

    /// Write the most dissimilar variable layer (<output>_MoD)
    #[arg(short = 'm')]
    most_dissimilar: bool,

    /// Write the mean of the IES layers (<output>_mean)
    #[arg(short = 'k')]
    mean: bool,

    /// Write the median of the IES layers (<output>_median)
    #[arg(short = 'c')]
    median: bool,

    /// Write the negative MESS mask (<output>_neg)
    #[arg(short = 'n')]
    negative: bool,

    /// Do not keep the per-variable IES layers
    #[arg(short = 'i')]
    drop_ies: bool,

    /// Directory holding the layers (<name>.tif rasters, <name>.csv points)
    #[arg(long = "data-dir", default_value = ".")]
    data_dir: PathBuf,

    /// Worker threads (default: all cores)
    #[arg(long)]
    threads: Option<usize>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn params(&self) -> MessParams {
        MessParams {
            digits: self.digits,
            outputs: OutputSelection {
                most_dissimilar: self.most_dissimilar,
                mean: self.mean,
                median: self.median,
                negative: self.negative,
                keep_ies: !self.drop_ies,
            },
        }
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn setup_threads(threads: Option<usize>) -> Result<()> {
    if let Some(n) = threads {
        if n == 0 {
            anyhow::bail!("--threads must be at least 1");
        }
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .context("Failed to configure the thread pool")?;
    }
    info!("Using {} thread(s)", rayon::current_num_threads());
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;
    setup_threads(cli.threads)?;

    let config = MessConfig::new(
        cli.env_var.clone(),
        cli.output.clone(),
        cli.ref_rast.clone(),
        cli.ref_vect.clone(),
        cli.params(),
    )
    .context("Invalid arguments")?;

    let store = DirectoryStore::new(&cli.data_dir);

    let pb = spinner("Computing MESS...");
    let start = Instant::now();
    let report = run(&store, &config);
    pb.finish_and_clear();
    let report = report.context("MESS failed")?;
    let elapsed = start.elapsed();

    for (variable, ids) in &report.discarded {
        println!(
            "{}: {} reference point(s) ignored ({})",
            variable,
            ids.len(),
            ids.join(", ")
        );
    }
    if cli.most_dissimilar {
        println!("Most dissimilar variable codes:");
        for (code, variable) in &report.legend {
            println!("  {} = {}", code, variable);
        }
    }

    println!("Layers written to: {}", store.root().display());
    for name in &report.written {
        println!("  {}", store.grid_path(name).display());
    }
    println!("  Processing time: {:.2?}", elapsed);

    Ok(())
}
