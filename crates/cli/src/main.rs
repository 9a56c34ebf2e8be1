mod manager;

use std::{
    fs::{self, OpenOptions},
    io,
    path::PathBuf,
    sync::Mutex,
};

use anyhow::{Context, Result};
use clap::Parser;
use library_core::{
    config::{self, AppConfig},
    Catalog,
};
use tracing::{info, warn};
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter};

use crate::manager::LibraryManager;

/// Interactive manager for a lending library catalog.
#[derive(Debug, Parser)]
#[command(name = "library-manager", version, about)]
struct Args {
    /// Configuration file to use instead of the default location.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Catalog file to open at startup.
    #[arg(long, value_name = "FILE")]
    open: Option<PathBuf>,

    /// Name for the empty catalog created at startup.
    #[arg(long)]
    name: Option<String>,

    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AppConfig::load_from(path)?,
        None => {
            config::ensure_default_config()?;
            AppConfig::load()?
        }
    };
    init_logging(&config, args.verbose)?;

    let store = config.store();
    let mut catalog = Catalog::new(args.name.unwrap_or_else(|| config.library_name.clone()));
    if let Some(path) = args.open.as_ref().or(config.autoload.as_ref()) {
        match store.open(path) {
            Ok(loaded) => catalog = loaded,
            Err(err) => {
                warn!("Startup catalog {} not loaded: {err:#}", path.display());
            }
        }
    }

    info!(
        name = %catalog.name(),
        root = %store.root().display(),
        "session started"
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut manager = LibraryManager::new(catalog, store, stdin.lock(), stdout.lock());
    manager.run()
}

fn init_logging(config: &AppConfig, verbose: bool) -> Result<()> {
    fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("failed to create log directory {}", config.log_dir.display()))?;
    let log_path = config.log_dir.join("library.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Prompts share stdout, so only warnings reach the terminal.
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(io::stderr)
        .with_filter(LevelFilter::WARN);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
