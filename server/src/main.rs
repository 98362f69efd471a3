//! Peer-channel relay for inkboard.
//!
//! Displays register under a session identity, a controller pairs with
//! one, and text frames flow verbatim between them.

mod config;
mod relay;
mod routes;
mod state;

use std::process::ExitCode;

use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            eprintln!("failed to read .env: {err}");
        }
    }
    tracing_subscriber::fmt::init();

    let config = match config::Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let state = state::AppState::new(&config);
    let app = routes::app(state);
    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(%addr, error = %err, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    info!(%addr, "inkboard relay listening");
    if let Err(err) = axum::serve(listener, app).await {
        error!(error = %err, "server failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
