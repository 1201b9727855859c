//! Movie explorer CLI - browse, search and bookmark TMDB movies
//!
//! Every API response is cached on disk for the configured TTL, so repeated
//! commands within that window do not hit the network.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use moviex::app::{App, AppError};
use moviex::cli::Cli;
use moviex::config::Config;
use moviex::data::{ApiClient, TmdbClient};
use moviex::favorites::FavoritesStore;

/// Sets up logging to stderr, keeping stdout for command output
///
/// `RUST_LOG` takes precedence over the `-v` flags.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("moviex={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Wires the cache, client and favorites together and runs the command
async fn run(cli: Cli) -> Result<String, AppError> {
    let config = Config::from_cli(&cli)?;
    if cli.command.needs_network() {
        config.require_api_key()?;
    }

    let cache = Arc::new(config.response_cache());
    let mut api = ApiClient::new(config.base_url.clone(), cache);
    if let Some(key) = &config.api_key {
        api = api.with_api_key(key.clone());
    }

    let favorites = FavoritesStore::load(config.favorites_storage());
    let mut app = App::new(TmdbClient::new(api), favorites)
        .with_json(cli.json)
        .with_prefetch(cli.prefetch);

    app.run(&cli.command).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
