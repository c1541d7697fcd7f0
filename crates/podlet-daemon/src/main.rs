// podletd - the podlet instance host daemon
//
// Hosts dynamically loaded plugin instances in one process and serves
// load/unload/list/clear over a Unix-socket JSON-RPC surface.

use anyhow::Result;
use podlet_daemon::{lifecycle, DaemonConfig, Server};
use std::process;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Exit codes for different scenarios
mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const CONFIG_ERROR: i32 = 1;
    pub const BIND_ERROR: i32 = 2;
    pub const RUNTIME_ERROR: i32 = 3;
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    info!("Starting podletd v{}", env!("CARGO_PKG_VERSION"));

    let config = match DaemonConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(exit_codes::CONFIG_ERROR);
        }
    };

    if lifecycle::is_daemon_running() {
        error!("Another podletd appears to be running (PID file {:?})", lifecycle::pid_path());
        process::exit(exit_codes::BIND_ERROR);
    }

    let pid_file = lifecycle::pid_path();
    if let Err(e) = lifecycle::write_pid_file(&pid_file) {
        warn!("Failed to write PID file {:?}: {}", pid_file, e);
    }

    let exit_code = match run(&config).await {
        Ok(()) => {
            info!("Daemon stopped");
            exit_codes::SUCCESS
        }
        Err(e) => {
            error!("Daemon error: {}", e);
            exit_codes::RUNTIME_ERROR
        }
    };

    lifecycle::remove_pid_file(&pid_file);
    process::exit(exit_code);
}

async fn run(config: &DaemonConfig) -> Result<()> {
    let socket = config.socket_path();
    let server = match Server::bind(&socket, config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to bind {:?}: {}", socket, e);
            process::exit(exit_codes::BIND_ERROR);
        }
    };

    // Ctrl-C triggers the same shutdown path as the RPC method.
    let shutdown_tx = server.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, shutting down");
            let _ = shutdown_tx.send(());
        }
    });

    let result = server.run().await;
    podlet_protocol::remove_socket(&socket);
    result
}
