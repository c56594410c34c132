//! # `fizzbuzz-server`
//!
//! HTTP service rendering FizzBuzz sequences on demand.
//!
//! ## Highlights
//! - **Streaming renders**: items are produced by a background task and
//!   cancelled as soon as the response is abandoned.
//! - **Usage statistics**: `/statistics` reports the most requested parameters.
//! - **TLS**: served over rustls when a certificate and key are configured.
//! - **Graceful shutdown**: clean Ctrl+C or SIGTERM handling.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p fizzbuzz-server --release -- --server-addr 127.0.0.1:8080
//! curl "http://127.0.0.1:8080/render?limit=15&int1=3&int2=5&str1=fizz&str2=buzz"
//! ```

use anyhow::Context;
use axum_server::{Handle, tls_rustls::RustlsConfig};
use clap::Parser;
use core::time::Duration;
use fizzbuzz_server::server::{
    config::{CliArgs, ServerConfig},
    routes::router,
    service::AppState,
    telemetry::init_telemetry,
};
use std::net::SocketAddr;
use tokio::signal;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Time given to open connections to finish once shutdown starts.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry(config.environment)?;

    let addr = tokio::net::lookup_host(&config.server_addr)
        .await
        .with_context(|| format!("invalid SERVER_ADDR `{}`", config.server_addr))?
        .next()
        .with_context(|| format!("SERVER_ADDR `{}` resolved to nothing", config.server_addr))?;

    let state = AppState::new(config.clone());
    let app = router(state.clone());
    let handle = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone(), state));

    log_startup_info(&addr, &config);

    let res = match &config.tls {
        Some(tls) => {
            let rustls = RustlsConfig::from_pem_file(&tls.cert, &tls.key)
                .await
                .context("failed to load TLS certificate or key")?;
            axum_server::bind_rustls(addr, rustls)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
        None => {
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
    };

    providers.shutdown();
    res?;

    tracing::info!("Service shut down successfully");
    Ok(())
}

fn log_startup_info(addr: &SocketAddr, config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "Starting FizzBuzz service on {} with full config: {:#?}",
            addr,
            config
        );
    } else {
        tracing::info!(
            environment = ?config.environment,
            tls = config.tls.is_some(),
            "Starting FizzBuzz service on {}",
            addr,
        );
    }
}

async fn shutdown_signal(handle: Handle, state: AppState) {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Shutdown signal received, terminating gracefully...");

    // 1. Stop every in-flight render
    state.shutdown();

    // 2. Let open connections drain
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
