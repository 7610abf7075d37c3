//! Ski Bus simulation CLI.
//!
//! Usage: `skibus L Z K TL TB`
//! - L: number of skiers (0 <= L < 20000)
//! - Z: number of stops (1 <= Z <= 10)
//! - K: bus capacity (10 <= K <= 100)
//! - TL: maximum walk to a stop, microseconds (0 <= TL <= 10000)
//! - TB: maximum ride between stops, microseconds (0 <= TB <= 1000)

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use skibus::RunOptions;
use skibus_kernel::{RawArgs, SimulationConfig};

#[derive(Parser)]
#[command(name = "skibus")]
#[command(version)]
#[command(about = "Ski bus rendezvous simulation")]
#[command(allow_negative_numbers = true)]
struct Cli {
    /// Number of skiers (L)
    skiers: i64,

    /// Number of bus stops (Z)
    stops: i64,

    /// Bus capacity (K)
    capacity: i64,

    /// Maximum walking time to a stop in microseconds (TL)
    max_walk_us: i64,

    /// Maximum travel time between stops in microseconds (TB)
    max_travel_us: i64,

    #[command(flatten)]
    options: RunOptions,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn raw_args(&self) -> RawArgs {
        RawArgs {
            skiers: self.skiers,
            stops: self.stops,
            capacity: self.capacity,
            max_walk_us: self.max_walk_us,
            max_travel_us: self.max_travel_us,
        }
    }
}

const USAGE: &str = "Usage: skibus L Z K TL TB";

/// Print a parse failure and exit. Help and version still exit 0.
fn exit_on_parse_error(err: clap::Error) -> ! {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
        _ => {
            let _ = err.print();
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::try_parse().unwrap_or_else(|err| exit_on_parse_error(err));

    let config = match SimulationConfig::try_from(cli.raw_args()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("{}", USAGE);
            std::process::exit(1);
        }
    };

    // Set up logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    cli.options.execute(config).await?;
    Ok(())
}
