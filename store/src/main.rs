use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use concord_store::config::StoreConfig;
use concord_store::entities::state::ChannelsState;
use concord_store::replay::replay;
use concord_store::store::Store;

/// Replay a log of channel entity actions and print the resulting state.
#[derive(Parser)]
#[command(name = "concord-store", version)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, default_value = "concord-store.toml")]
    config: PathBuf,

    /// JSON file with the state to start from (overrides the config file).
    #[arg(long)]
    initial_state: Option<PathBuf>,

    /// Pretty-print the final state.
    #[arg(long)]
    pretty: bool,

    /// JSON-lines file with one `{"type": ..., "data": ...}` action per line.
    actions: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = StoreConfig::load(&cli.config)?;

    // Logs go to stderr; stdout carries only the final state.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.replay.log_filter)),
        )
        .init();

    match &config.loaded_from {
        Some(path) => info!(path = %path.display(), "loaded config"),
        None => info!(path = %cli.config.display(), "no config file found, using defaults"),
    }

    let initial = match cli.initial_state.or(config.replay.initial_state) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read initial state {}", path.display()))?;
            info!(path = %path.display(), "loaded initial state");
            ChannelsState::from_json(&json)?
        }
        None => ChannelsState::default(),
    };

    let mut store = Store::new(initial);

    let file = File::open(&cli.actions)
        .with_context(|| format!("failed to open action log {}", cli.actions.display()))?;
    replay(&mut store, BufReader::new(file))?;

    let state = store.snapshot();
    let output = if cli.pretty || config.replay.pretty {
        serde_json::to_string_pretty(&*state)?
    } else {
        serde_json::to_string(&*state)?
    };
    println!("{output}");

    Ok(())
}
