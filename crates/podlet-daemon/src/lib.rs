//! podlet instance host daemon
//!
//! Library for running the daemon server that hosts plugin instances and
//! exposes load/unload/list/clear over a Unix-socket JSON-RPC surface.

pub mod builtins;
pub mod config;
pub mod lifecycle;
pub mod rpc_helpers;
pub mod server;

pub use config::DaemonConfig;
pub use lifecycle::{is_daemon_running, pid_path, write_pid_file};
pub use server::Server;
