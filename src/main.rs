use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pullexec::config::parse_interval;
use pullexec::{Config, ConfigOverrides, GitRepository, ShellCommandRunner, SyncLoop, DEFAULT_REMOTE};

#[derive(Parser)]
#[command(name = "pullexec")]
#[command(about = "Continuously pull an already cloned git repository and execute a command whenever a change is pulled")]
#[command(version)]
struct Cli {
    /// Local path of the repository to pull [default: .]
    #[arg(long, value_name = "PATH")]
    repository_path: Option<String>,

    /// Command to execute on successful pull (required, here or in the config file)
    #[arg(short, long, value_name = "COMMAND")]
    execute: Option<String>,

    /// Pull interval, in seconds or with a unit suffix like 30s, 5m, 1h [default: 60]
    #[arg(long, value_name = "DURATION", value_parser = parse_interval)]
    pull_interval: Option<Duration>,

    /// Maximum successive retries after failing to pull [default: 3]
    #[arg(long, value_name = "N")]
    max_retries: Option<u32>,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            repository_path: self.repository_path.clone(),
            execute: self.execute.clone(),
            pull_interval: self.pull_interval,
            max_retries: self.max_retries,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!("Starting pullexec v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;

    let repository = GitRepository::open(&config.repository_path)
        .await
        .context("Failed to open repository")?;
    info!("Watching repository: {}", repository.root().display());

    match repository.remote_url(DEFAULT_REMOTE).await? {
        Some(url) => info!("Pulling from {} ({})", DEFAULT_REMOTE, url),
        None => warn!(
            "Repository has no '{}' remote, every pull will fail",
            DEFAULT_REMOTE
        ),
    }

    SyncLoop::new(config, repository, ShellCommandRunner::new())
        .run()
        .await
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Build the effective configuration: file, then command line, then validation
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default()?,
    };

    config.apply_overrides(cli.overrides());
    config.expand_paths()?;
    config.validate()?;

    Ok(config)
}
