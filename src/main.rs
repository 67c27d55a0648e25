//! tree-cache - two-phase CI build cache
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tree_cache::cli::{Cli, Commands};
use tree_cache::config::schema::LogFormat;
use tree_cache::config::{Config, ConfigManager};
use tree_cache::error::{TreeCacheError, TreeCacheResult};
use tree_cache::host::github;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_failure(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> TreeCacheResult<()> {
    let cli = Cli::parse();
    let config = load_config(&cli).await?;

    init_logging(cli.verbose, cli.log_format.unwrap_or(config.general.log_format));

    match cli.command {
        Commands::Restore(args) => tree_cache::cli::commands::restore(args, &config).await,
        Commands::Save(args) => tree_cache::cli::commands::save(args, &config).await,
        Commands::Key(args) => tree_cache::cli::commands::key(args, &config).await,
    }
}

/// Explicit config file, else `.tree-cache.toml` above the repository
/// directory (the working directory for `save`), else defaults
async fn load_config(cli: &Cli) -> TreeCacheResult<Config> {
    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path.clone()),
        None => {
            let cwd = std::env::current_dir()
                .map_err(|e| TreeCacheError::io("getting current directory", e))?;
            let start = match &cli.command {
                Commands::Restore(args) => cwd.join(&args.tree.repo_dir),
                Commands::Key(args) => cwd.join(&args.tree.repo_dir),
                Commands::Save(_) => cwd,
            };
            ConfigManager::find_local_config(&start)
                .map(ConfigManager::with_path)
                .unwrap_or_default()
        }
    };
    manager.load().await
}

/// Phase messages are the step's output, so info is shown by default.
/// `RUST_LOG` overrides the verbosity flags.
fn init_logging(verbose: u8, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 | 1 => EnvFilter::new("tree_cache=info"),
        _ => EnvFilter::new("tree_cache=debug"),
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    debug!("Log format: {:?}", format);
}

/// Report an error once, both for humans and for the CI host
fn report_failure(e: &TreeCacheError) {
    eprintln!("{} {}", style("Error:").red().bold(), e);
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        eprintln!("  {} {}", style("Caused by:").dim(), cause);
        source = cause.source();
    }
    if let Some(hint) = e.hint() {
        eprintln!("{} {}", style("Hint:").yellow(), hint);
    }
    if github::is_github_actions() {
        println!("{}", github::error_annotation(&e.to_string()));
    }
}
