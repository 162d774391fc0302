//! Parley CLI and REST API entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, loads configuration, then either validates it or
//! starts the REST API server.

mod cli;
mod http;
mod state;

use anyhow::Context;
use clap::Parser;

use parley_infra::config::{database_url, default_config_path, load_config, require_secret};
use parley_observe::tracing_setup::{LogFormat, init_tracing, shutdown_tracing};
use parley_types::config::AppConfig;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing(format, cli.verbose, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = load_config(&config_path)
        .await
        .with_context(|| format!("loading {}", config_path.display()))?;

    let result = match cli.command {
        Commands::CheckConfig => check_config(&config),
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            serve(&config).await
        }
    };

    shutdown_tracing();
    result
}

/// Validate the configuration and print a summary without secrets.
fn check_config(config: &AppConfig) -> anyhow::Result<()> {
    require_secret(config)?;

    println!("  bind:              {}", config.server.bind);
    println!("  database:          {}", database_url(config));
    println!("  access ttl:        {} min", config.auth.access_ttl_minutes);
    println!("  refresh ttl:       {} days", config.auth.refresh_ttl_days);
    println!("  completion api:    {}", config.completion.base_url);
    println!("  completion model:  {}", config.completion.model);
    println!(
        "  completion key:    {}",
        if config.completion.api_key.is_some() {
            "set"
        } else {
            "missing"
        }
    );
    println!("  history window:    {}", config.completion.history_limit);
    println!("\n  Configuration OK.");
    Ok(())
}

/// Start the REST API server and run until Ctrl+C or SIGTERM.
async fn serve(config: &AppConfig) -> anyhow::Result<()> {
    let state = AppState::init(config).await?;

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("binding {}", config.server.bind))?;
    tracing::info!(addr = %config.server.bind, "Parley API listening");

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
