use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tag_positioning::{lookup_position, EngineConfig, EstimationLoop, JsonFileStore, PositionQuery};

#[derive(Parser, Debug)]
#[command(name = "tag-positioning", version, about = "Trilateration-based tag position estimation")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON store document (overrides the configured path)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Continuously estimate and store tag positions
    Run {
        /// Delay between cycles in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Stop after this many cycles instead of running forever
        #[arg(long)]
        cycles: Option<u64>,
    },

    /// Print the stored position of one device as JSON
    #[command(group(ArgGroup::new("query").required(true).args(["mac", "id", "num_device"])))]
    Lookup {
        #[arg(long)]
        mac: Option<String>,

        #[arg(long)]
        id: Option<i64>,

        /// 1-based row number in the device table
        #[arg(long)]
        num_device: Option<usize>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load_from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(path) = cli.store {
        config.store_path = path;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    let store = JsonFileStore::new(&config.store_path);

    match cli.command {
        Command::Run { interval_ms, cycles } => {
            if let Some(interval_ms) = interval_ms {
                config.set_cycle_interval_ms(interval_ms)?;
            }
            let mut estimation_loop = EstimationLoop::from_config(store, &config);
            match cycles {
                Some(count) => {
                    let stats = estimation_loop.run_cycles(count);
                    info!(
                        cycles = stats.cycles,
                        updated = stats.updated,
                        skipped = stats.skipped,
                        failed = stats.failed,
                        positions_written = stats.positions_written,
                        "estimation finished"
                    );
                }
                None => estimation_loop.run(),
            }
        }
        Command::Lookup { mac, id, num_device } => {
            let query = match (mac, id, num_device) {
                (Some(mac), _, _) => PositionQuery::Mac(mac),
                (None, Some(id), _) => PositionQuery::Id(id),
                (None, None, Some(n)) => PositionQuery::Ordinal(n),
                (None, None, None) => return Err("one of --mac, --id or --num-device is required".into()),
            };
            let position = lookup_position(&store, &query)?;
            println!("{}", serde_json::to_string(&position)?);
        }
    }

    Ok(())
}
