//! The acceptor (C6): binds the listen port named on the command line,
//! spawns a worker per accepted connection, and shuts down gracefully on
//! SIGINT/SIGTERM.

use rustyproxy::cache::{MAX_CACHE_SIZE, MAX_OBJECT_SIZE};
use rustyproxy::config::parse_args;
use rustyproxy::coordinator::CacheCoordinator;
use rustyproxy::forward::handle_connection;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("rustyproxy=info")),
        )
        .init();

    let config = match parse_args(std::env::args()) {
        Ok(config) => config,
        Err(usage) => {
            eprintln!("{usage}");
            return ExitCode::FAILURE;
        }
    };

    info!("Forward proxy starting");
    info!("Listening on port {}", config.port);
    info!(
        "Cache limits: max object size {} bytes, max cache size {} bytes",
        MAX_OBJECT_SIZE, MAX_CACHE_SIZE
    );

    let listener = match TcpListener::bind(("0.0.0.0", config.port)).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind listen port: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let cache = Arc::new(CacheCoordinator::new());

    let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
    {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to install SIGTERM handler: {}", e);
            return ExitCode::FAILURE;
        }
    };

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT, shutting down");
                break;
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
                break;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, addr)) => {
                        debug!("Accepted connection from {}", addr);
                        let cache = cache.clone();
                        tokio::spawn(async move {
                            handle_connection(stream, cache).await;
                        });
                    }
                    Err(e) => {
                        warn!("Failed to accept connection: {}", e);
                    }
                }
            }
        }
    }

    ExitCode::SUCCESS
}
