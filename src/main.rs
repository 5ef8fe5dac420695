//! ddddctl - launcher and client for the ddddocr service
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use ddddctl::cli::{commands, Cli, Commands};
use ddddctl::config::{Config, ConfigManager};
use ddddctl::error::DdddResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> DdddResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = match config_manager.load().await {
        Ok(config) => config,
        // `config init --force` must still work on a broken file
        Err(e) if matches!(cli.command, Commands::Config(_)) => {
            eprintln!("{} {}", style("Warning:").yellow(), e);
            Config::default()
        }
        Err(e) => return Err(e),
    };

    init_logging(cli.verbose, &config);
    debug!("Using config {}", config_manager.path().display());
    ddddctl::ui::init_theme();

    match cli.command {
        Commands::Start(args) => commands::start(args, &config).await,
        Commands::Ocr(args) => commands::ocr(args, &config).await,
        Commands::Det(args) => commands::det(args, &config).await,
        Commands::Slide(args) => commands::slide(args, &config).await,
        Commands::Legacy(args) => commands::legacy(args, &config).await,
        Commands::Ping(args) => commands::ping(args, &config).await,
        Commands::Mcp(args) => commands::mcp(args, &config).await,
        Commands::Smoke(args) => commands::smoke(args, &config).await,
        Commands::Status => commands::status(&config).await,
        Commands::Cache(args) => commands::cache(args, &config).await,
        Commands::Config(args) => commands::config(args, &config, &config_manager).await,
    }
}

/// 0 = warn, 1 = info, 2+ = debug. Logs go to stderr so results stay pipeable.
fn init_logging(verbose: u8, config: &Config) {
    let filter = match verbose {
        0 => EnvFilter::new("ddddctl=warn"),
        1 => EnvFilter::new("ddddctl=info"),
        _ => EnvFilter::new("ddddctl=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}
