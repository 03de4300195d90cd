mod config;
mod logging;

use std::path::PathBuf;

use anyhow::Result;
use api_gateway::ClinicClients;
use clap::Parser;

use crate::config::AppConfig;

/// Clinic REST gateway server
#[derive(Parser, Debug)]
#[command(name = "carebridge-server", version, about)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `api_gateway.bind_addr`
    #[arg(long)]
    bind: Option<String>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.api_gateway.bind_addr = bind;
    }

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    logging::init_logging(&config.logging)?;
    run(config).await
}

async fn run(config: AppConfig) -> Result<()> {
    tracing::info!(
        bind_addr = %config.api_gateway.bind_addr,
        require_tenant = config.api_gateway.tenancy.require_tenant,
        require_database_uuid = config.api_gateway.tenancy.require_database_uuid,
        "Starting CareBridge gateway"
    );

    let service = static_clinic_plugin::build_service(&config.static_clinic);
    let router = api_gateway::build_router(
        &config.api_gateway,
        ClinicClients::from_backend(service),
        axum::Router::new(),
    )?;

    api_gateway::serve(router, &config.api_gateway.bind_addr, shutdown_signal()).await?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
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
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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
    tracing::info!("HTTP server shutting down gracefully");
}
