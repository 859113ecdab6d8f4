// Main entrypoint for the sitemetrics command line client.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use sitemetrics::config::{Backend, Config, ConfigTrait};
use sitemetrics::{Counters, HashStore, InMemoryStore, RedisStore};

const CONFIG_PATH: &str = "cfg/sitemetrics.cfg.yaml";
const CONFIG_PATH_LOCAL: &str = "cfg/sitemetrics.cfg.local.yaml";

/// sitemetrics - per-site counters kept in a shared Redis hash
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long, value_name = "FILE")]
    cfg: Option<PathBuf>,

    /// Site name, overrides the configured one
    #[arg(short, long)]
    site: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Increment a counter and print its new value
    Incr {
        metric: String,
        #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
        amount: i128,
    },
    /// Delete a counter and print how many fields were removed
    Remove { metric: String },
    /// Print every counter of the site as JSON
    Stats,
}

/// Loads the configuration struct from YAML file.
/// Tries local config first, then falls back to default config.
fn load_cfg(path: Option<PathBuf>) -> Result<Config> {
    if let Some(custom_path) = path {
        return Config::load(&custom_path)
            .with_context(|| format!("failed to load custom config from {:?}", custom_path));
    }

    match Config::load(PathBuf::from(CONFIG_PATH_LOCAL)) {
        Ok(cfg) => Ok(cfg),
        Err(_) => Config::load(PathBuf::from(CONFIG_PATH))
            .with_context(|| format!("failed to load config from {}", CONFIG_PATH)),
    }
}

/// Configures structured logging based on configuration.
fn configure_logger(cfg: &Config) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let log_level = cfg
        .logs()
        .and_then(|logs| logs.level.as_ref())
        .map(|s| s.as_str())
        .unwrap_or("info");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    // Logs go to stderr so stdout only carries command output.
    if cfg.is_prod() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .init();
    }
}

/// Builds and initializes the configured store backend.
fn open_store(cfg: &Config) -> Result<Arc<dyn HashStore>> {
    let store_cfg = cfg.store();
    match store_cfg.backend {
        Backend::Memory => Ok(Arc::new(InMemoryStore::with_prefix(store_cfg.namespace()))),
        Backend::Redis => {
            let store = RedisStore::new(&store_cfg).context("invalid redis configuration")?;
            store
                .init()
                .with_context(|| format!("failed to connect to {}", store_cfg.url()))?;
            Ok(Arc::new(store))
        }
    }
}

fn run(args: Args) -> Result<()> {
    let cfg = load_cfg(args.cfg)?;
    configure_logger(&cfg);

    let site = args
        .site
        .or_else(|| cfg.site().map(str::to_string))
        .context("no site configured, set metrics.site or pass --site")?;
    info!(component = "main", event = "site_configured", site = %site, "site configured");

    let counters = Counters::with_site(open_store(&cfg)?, site);

    match args.command {
        Command::Incr { metric, amount } => {
            println!("{}", counters.increment_by(&metric, amount)?);
        }
        Command::Remove { metric } => {
            println!("{}", counters.remove(&metric)?);
        }
        Command::Stats => {
            println!("{}", serde_json::to_string_pretty(&counters.stats()?)?);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Err(e) = run(args) {
        error!(component = "main", event = "command_failed", error = %e, "command failed");
        return Err(e);
    }
    Ok(())
}
