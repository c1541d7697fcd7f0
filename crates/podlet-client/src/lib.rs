//! Client library for connecting to the podlet daemon (podletd)
//!
//! [`DaemonClient`] connects over the daemon's Unix socket and exposes a
//! typed helper per RPC method. A missing or stale socket surfaces as a
//! connect error.

mod client;

pub use client::{DaemonClient, LoadRequest};

pub use podlet_protocol::socket_path;
