//! Unix socket server for JSON-RPC
//!
//! Translates the wire surface (`instance.load` / `instance.unload` /
//! `instance.list` / `instance.clear`) into calls on the
//! [`InstanceRegistry`]. Registry failures come back as `success: false`
//! with a diagnostic message; JSON-RPC errors are reserved for protocol
//! problems (bad params, unknown methods, malformed JSON).

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use podlet_core::{ConstructorFactory, InstanceRegistry, RemapTable};
use podlet_protocol::{
    Request, RequestId, Response, INTERNAL_ERROR, METHOD_NOT_FOUND, PARSE_ERROR,
};

use crate::builtins;
use crate::config::DaemonConfig;
use crate::{require_str_param, str_array_param};

/// Log internal error details and return a generic error message.
fn internal_error(req_id: Option<RequestId>, err: impl std::fmt::Display) -> Response {
    error!("Internal error: {}", err);
    Response::error(req_id, INTERNAL_ERROR, "Internal server error")
}

/// Daemon server that listens on a Unix socket
pub struct Server {
    listener: UnixListener,
    shutdown_tx: broadcast::Sender<()>,
    registry: Arc<InstanceRegistry>,
}

impl Server {
    /// Bind to a Unix socket path with the built-in instance kinds.
    pub async fn bind(path: &Path, config: &DaemonConfig) -> Result<Self> {
        let mut factory = ConstructorFactory::new();
        builtins::register(&mut factory);
        let registry = Arc::new(InstanceRegistry::new(
            Arc::new(factory),
            config.worker_threads,
        ));
        Self::bind_with_registry(path, registry).await
    }

    /// Bind to a Unix socket path around an externally built registry.
    ///
    /// Lets embedders (and tests) supply their own factory and pool sizing.
    pub async fn bind_with_registry(path: &Path, registry: Arc<InstanceRegistry>) -> Result<Self> {
        // Remove stale socket
        if path.exists() {
            std::fs::remove_file(path)?;
        }

        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let listener = UnixListener::bind(path)?;
        let (shutdown_tx, _) = broadcast::channel(1);

        info!("Daemon listening on {:?}", path);
        info!(
            "Dispatch pool running {} worker thread(s), {} instance kind(s) declared",
            registry.worker_count(),
            registry.declared_kinds().len()
        );

        Ok(Self {
            listener,
            shutdown_tx,
            registry,
        })
    }

    /// Get a shutdown sender for external shutdown triggers
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// The registry this server fronts.
    pub fn registry(&self) -> Arc<InstanceRegistry> {
        self.registry.clone()
    }

    /// Run the server until shutdown
    pub async fn run(self) -> Result<()> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                accept_result = self.listener.accept() => {
                    match accept_result {
                        Ok((stream, _)) => {
                            let registry = self.registry.clone();
                            let shutdown_tx = self.shutdown_tx.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_client(stream, registry, shutdown_tx).await {
                                    error!("Client error: {}", e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        // Releasing every instance here, before the registry (and its pool)
        // drop, keeps teardown ordering identical to an explicit clear.
        self.registry.clear();
        Ok(())
    }
}

async fn handle_client(
    stream: UnixStream,
    registry: Arc<InstanceRegistry>,
    shutdown_tx: broadcast::Sender<()>,
) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(req) => handle_request(req, &registry, &shutdown_tx).await,
            Err(e) => {
                debug!("Failed to parse request: {}", e);
                Response::error(None, PARSE_ERROR, format!("Invalid JSON: {}", e))
            }
        };

        let json = response.to_json_line()?;
        writer.write_all(json.as_bytes()).await?;
    }

    Ok(())
}

async fn handle_request(
    req: Request,
    registry: &Arc<InstanceRegistry>,
    shutdown_tx: &broadcast::Sender<()>,
) -> Response {
    debug!(method = %req.method, "handling request");
    match req.method.as_str() {
        "ping" => Response::success(req.id, "pong"),
        "instance.load" => handle_load(req, registry).await,
        "instance.unload" => handle_unload(req, registry),
        "instance.list" => {
            Response::success(req.id, json!({ "instances": registry.list() }))
        }
        "instance.clear" => {
            registry.clear();
            Response::success(req.id, json!({ "success": true }))
        }
        "instance.kinds" => {
            Response::success(req.id, json!({ "kinds": registry.declared_kinds() }))
        }
        "shutdown" => {
            info!("Shutdown requested over RPC");
            let _ = shutdown_tx.send(());
            Response::success(req.id, json!({ "success": true }))
        }
        method => Response::error(
            req.id,
            METHOD_NOT_FOUND,
            format!("Unknown method: {}", method),
        ),
    }
}

async fn handle_load(req: Request, registry: &Arc<InstanceRegistry>) -> Response {
    let name = require_str_param!(req, "name").to_string();
    let kind = require_str_param!(req, "type").to_string();
    let remap_sources = str_array_param!(req, "remap_sources");
    let remap_targets = str_array_param!(req, "remap_targets");
    let args = str_array_param!(req, "args");

    // A length mismatch degrades to an empty table inside from_pairs; the
    // load still proceeds.
    let remaps = RemapTable::from_pairs(&remap_sources, &remap_targets);

    // `load` invokes the instance's init, which may run long; keep it off
    // the async runtime threads.
    let registry = registry.clone();
    let load_name = name.clone();
    let result = tokio::task::spawn_blocking(move || {
        registry.load(&load_name, &kind, remaps, args)
    })
    .await;

    match result {
        Ok(Ok(())) => Response::success(req.id, json!({ "success": true })),
        Ok(Err(e)) => {
            warn!(name = %name, error = %e, "load failed");
            Response::success(
                req.id,
                json!({ "success": false, "error": e.to_string() }),
            )
        }
        Err(e) => internal_error(req.id, e),
    }
}

fn handle_unload(req: Request, registry: &Arc<InstanceRegistry>) -> Response {
    let name = require_str_param!(req, "name");
    let success = registry.unload(name);
    if !success {
        warn!(name, "unload failed: no instance with that name");
    }
    Response::success(req.id.clone(), json!({ "success": success }))
}
