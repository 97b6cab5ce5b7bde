//! live-config control server.
//!
//! Declares its own settings in the default registry, reads them from the
//! environment and command line, then serves the control endpoint so they
//! can be inspected and changed while it runs.
//!
//! ```text
//! LIVE_CONFIG_ADDR            --addr             bind address
//! LIVE_CONFIG_API_KEY         --api-key          bearer token (empty: no auth)
//! LIVE_CONFIG_REQUEST_TIMEOUT --request-timeout  per-request timeout
//! LIVE_CONFIG_LOG             --log              tracing directive
//! ```

use std::time::Duration;

use tokio::net::TcpListener;

use live_config::{logging, ControlEndpoint, VarConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (addr, _) = live_config::declare(
        VarConfig::new(String::from("127.0.0.1:8081"))
            .env("LIVE_CONFIG_ADDR")
            .flag("addr")
            .description("Control endpoint bind address"),
    );
    let (api_key, _) = live_config::declare(
        VarConfig::new(String::new())
            .env("LIVE_CONFIG_API_KEY")
            .flag("api-key")
            .description("Bearer token required by the control endpoint"),
    );
    let (request_timeout, _) = live_config::declare(
        VarConfig::new(Duration::from_secs(10))
            .env("LIVE_CONFIG_REQUEST_TIMEOUT")
            .flag("request-timeout")
            .description("Per-request timeout"),
    );
    let (log, _) = live_config::declare(
        VarConfig::new(String::from("live_config=info,tower_http=info"))
            .env("LIVE_CONFIG_LOG")
            .flag("log")
            .description("Log filter directive (RUST_LOG wins when set)"),
    );

    let read = live_config::read_all();
    logging::init_tracing(&log.get())?;
    if let Err(e) = read {
        tracing::warn!(error = %e, "Rejected environment values; defaults kept");
    }

    tracing::info!("live-config v{} starting", env!("CARGO_PKG_VERSION"));

    let router = ControlEndpoint::new(live_config::global().clone())
        .with_api_key(api_key.cloned())
        .with_request_timeout(*request_timeout.get())
        .into_router();

    let listener = TcpListener::bind(addr.get().as_str()).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        variables = live_config::global().len(),
        auth = !api_key.get().is_empty(),
        "Control endpoint listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
