//! Rentledger main entry point

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use rentledger_api::start_server;
use rentledger_config::{Config, ConfigError};
use rentledger_core::{MemoryStore, Stores, TaxService};
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "rentledger")]
#[command(author = "Rentledger Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Monthly tax and utility rollup for rental properties", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// JSON seed file with payments and expenses (overrides data.seed_file)
    #[arg(short, long)]
    seed: Option<PathBuf>,
}

fn load_config(path: &Path) -> anyhow::Result<(Config, bool)> {
    match Config::load(path) {
        Ok(config) => Ok((config, true)),
        Err(ConfigError::FileNotFound { .. }) => Ok((Config::default(), false)),
        Err(e) => Err(e).with_context(|| format!("Failed to load configuration from {}", path.display())),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let (config, found) = load_config(&args.config)?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.logging.level.as_str())).init();

    if found {
        log::info!("Config loaded from {}", args.config.display());
    } else {
        log::warn!("Config file not found: {}, using defaults", args.config.display());
    }

    let rt = Runtime::new().context("Failed to start the tokio runtime")?;

    rt.block_on(async {
        let seed = args.seed.clone().or_else(|| config.data.seed_file.clone());
        let store = match seed {
            Some(path) => MemoryStore::load_seed(&path)
                .await
                .with_context(|| format!("Failed to load seed data from {}", path.display()))?,
            None => MemoryStore::new(),
        };
        let stores = Stores::memory(Arc::new(store));

        let (service, worker) = TaxService::build(&config, stores).context("Failed to start the tax service")?;
        let _recompute = worker.map(|worker| worker.spawn());
        log::info!(
            "Default tax rate {}, amounts rounded to {} places",
            service.default_rate(),
            config.currency.decimal_places
        );

        start_server(config, Arc::new(service)).await.context("Server failed")
    })
}
