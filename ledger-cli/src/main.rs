//! `ledger-node`: runs one node of the peer-to-peer ledger.
//!
//! Wires a [`ledger::Coordinator`] (chain, mempool, peer set, and the
//! mining and background tasks) to an HTTP ingress server, and drives
//! both to completion, shutting down cleanly on Ctrl-C or SIGTERM.

mod cli;

use std::net::SocketAddr;

use clap::Parser;
use ledger::Coordinator;
use tokio::signal;
use tokio::sync::broadcast;

use cli::Cli;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "ledger_cli=info,ledger=info,ledger_gateway=info".to_string()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(error) = run(cli).await {
        tracing::error!(%error, "fatal error");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let self_endpoint = ledger::PeerEndpoint::new("127.0.0.1", cli.port)
        .map_err(|e| format!("invalid listen port: {e}"))?;
    let node_config = cli.into_node_config()?;

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let (coordinator, coordinator_join) = Coordinator::spawn(self_endpoint, node_config.clone(), shutdown_rx)
        .map_err(|e| format!("failed to start coordinator: {e}"))?;

    let app = ledger_gateway::router(coordinator);

    let addr = SocketAddr::from(([0, 0, 0, 0], node_config.listen_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("failed to bind {addr}: {e}"))?;

    tracing::info!(%addr, difficulty = node_config.difficulty, "ledger node listening");

    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(error) = result {
                tracing::error!(%error, "HTTP server exited with an error");
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, stopping coordinator");
            let _ = shutdown_tx.send(());
        }
    }

    let _ = coordinator_join.await;
    Ok(())
}

/// Waits for Ctrl-C (or, on Unix, SIGTERM) so the node can shut down
/// cleanly and persist its final chain state.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
