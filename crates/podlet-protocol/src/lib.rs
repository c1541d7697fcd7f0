//! Shared wire types for talking to the podlet daemon.
//!
//! The daemon speaks JSON-RPC 2.0 over a Unix socket, one JSON object per
//! line. This crate holds the request/response types, the standard error
//! codes, and socket path resolution, so server and clients agree on both.

mod protocol;

pub use protocol::{
    Request, RequestId, Response, RpcError, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST,
    METHOD_NOT_FOUND, PARSE_ERROR,
};

use std::fs;
use std::path::{Path, PathBuf};

/// Get the socket path for the daemon
///
/// Priority:
/// 1. `PODLET_SOCKET` environment variable (if set)
/// 2. `$XDG_RUNTIME_DIR/podlet.sock` (if XDG_RUNTIME_DIR is set)
/// 3. `/tmp/podlet.sock` (fallback)
pub fn socket_path() -> PathBuf {
    if let Ok(path) = std::env::var("PODLET_SOCKET") {
        return PathBuf::from(path);
    }
    dirs::runtime_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("podlet.sock")
}

/// Remove a (possibly stale) socket file, ignoring errors.
pub fn remove_socket(path: &Path) {
    let _ = fs::remove_file(path);
}
