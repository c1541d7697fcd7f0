//! Daemon configuration, resolved once at startup.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

/// Configuration for `podletd`.
///
/// Layered: an optional TOML file (`PODLET_CONFIG`, else
/// `~/.config/podlet/config.toml`), then environment variable overrides.
/// The worker-thread count is a construction-time value for the dispatch
/// pool, not mutable global state; `None` means the pool's default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    /// Unix socket to listen on. Defaults to the shared protocol path.
    pub socket: Option<PathBuf>,
    /// Worker-thread count for the shared dispatch pool.
    pub worker_threads: Option<usize>,
}

impl DaemonConfig {
    /// Load the config file (if any) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_file_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env();
        debug!(?config, "daemon configuration resolved");
        Ok(config)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    /// `PODLET_CONFIG` override, else `~/.config/podlet/config.toml`.
    fn config_file_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("PODLET_CONFIG") {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("podlet").join("config.toml"))
    }

    fn apply_env(&mut self) {
        if let Ok(count) = std::env::var("PODLET_WORKER_THREADS") {
            if let Ok(count) = count.parse::<usize>() {
                self.worker_threads = Some(count);
            }
        }
        if let Ok(path) = std::env::var("PODLET_SOCKET") {
            self.socket = Some(PathBuf::from(path));
        }
    }

    /// The socket the daemon should listen on.
    pub fn socket_path(&self) -> PathBuf {
        self.socket
            .clone()
            .unwrap_or_else(podlet_protocol::socket_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_protocol_socket() {
        let config = DaemonConfig::default();
        assert_eq!(config.socket_path(), podlet_protocol::socket_path());
        assert_eq!(config.worker_threads, None);
    }

    #[test]
    fn parses_full_toml() {
        let config: DaemonConfig =
            toml::from_str("socket = \"/run/podlet/test.sock\"\nworker_threads = 4\n").unwrap();
        assert_eq!(config.socket_path(), PathBuf::from("/run/podlet/test.sock"));
        assert_eq!(config.worker_threads, Some(4));
    }

    #[test]
    fn parses_partial_toml() {
        let config: DaemonConfig = toml::from_str("worker_threads = 2\n").unwrap();
        assert_eq!(config.worker_threads, Some(2));
        assert!(config.socket.is_none());
    }

    #[test]
    fn rejects_unknown_fields() {
        let result: Result<DaemonConfig, _> = toml::from_str("threads = 2\n");
        assert!(result.is_err());
    }

    #[test]
    fn from_file_reads_toml() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "worker_threads = 8\n").unwrap();

        let config = DaemonConfig::from_file(&path).unwrap();
        assert_eq!(config.worker_threads, Some(8));
    }

    #[test]
    fn from_file_missing_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let result = DaemonConfig::from_file(&tmp.path().join("nope.toml"));
        assert!(result.is_err());
    }
}
