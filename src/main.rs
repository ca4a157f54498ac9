//! modelgate HTTP server
//!
//! Starts an Axum web server that authorizes callers and routes chat
//! requests to the configured model deployments.

use clap::Parser;
use modelgate::{
    cli::{Cli, Command, generate_config_template},
    config::{Config, Environment},
    handlers::{self, AppState},
    telemetry,
};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command {
        let template = generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(&path, template)?;
                eprintln!("Wrote configuration template to {}", path);
            }
            None => print!("{}", template),
        }
        return Ok(());
    }

    let config = Config::from_file(&cli.config)?;

    telemetry::init(&config.observability.log_level);

    tracing::info!(
        "Starting modelgate on {}:{}",
        config.server.host,
        config.server.port
    );

    let env = Environment::from_process();
    if let Err(e) = env.require_default_backend() {
        // Requests will fail with 500 until this is fixed; keep serving health checks
        tracing::error!(error = %e, "Shared backend deployment is not configured");
    }

    let addr = SocketAddr::from((
        config
            .server
            .host
            .parse::<std::net::IpAddr>()
            .unwrap_or_else(|_| std::net::IpAddr::from([0, 0, 0, 0])),
        config.server.port,
    ));

    let state = AppState::new(Arc::new(config), env)?;
    let app = handlers::app(state);

    tracing::info!("Listening on {}", addr);
    tracing::info!("Chat endpoint available at http://{}/api/chat", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
