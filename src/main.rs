// Main entry point - Dependency injection and command dispatch
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::infrastructure::config::load_app_config;
use crate::infrastructure::http_metrics_repository::HttpMetricsRepository;
use crate::presentation::cli::Cli;
use crate::presentation::commands::App;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; RUST_LOG wins over -v
    let default_filter = match cli.verbose {
        0 => "panelscope=info",
        1 => "panelscope=debug",
        _ => "panelscope=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config = load_app_config(cli.config.as_deref())?;
    tracing::debug!(backend = %config.backend.url, dashboard = %config.dashboard.path.display(), "loaded configuration");

    // Create repository (infrastructure layer)
    let repository = Arc::new(HttpMetricsRepository::new(
        &config.backend.url,
        config.backend.timeout(),
    )?);

    // Run the command (presentation layer)
    let app = App::new(config, repository);
    let mut stdout = std::io::stdout().lock();
    app.run(cli.command, &mut stdout).await
}
