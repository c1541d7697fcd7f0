//! Daemon lifecycle: PID file and running-status checks.
//!
//! Socket path resolution lives in `podlet-protocol` so clients share it.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the PID file path
///
/// Falls back to `/tmp` when no config directory can be resolved.
pub fn pid_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("podlet")
        .join("daemon.pid")
}

/// Write PID file
pub fn write_pid_file(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, std::process::id().to_string())?;
    Ok(())
}

/// Remove PID file
pub fn remove_pid_file(path: &Path) {
    let _ = fs::remove_file(path);
}

/// Check if daemon is running by checking PID file and /proc
pub fn is_daemon_running() -> bool {
    is_daemon_running_at(&pid_path())
}

/// Check if daemon is running at specific PID file path
pub fn is_daemon_running_at(path: &Path) -> bool {
    if let Ok(contents) = fs::read_to_string(path) {
        if let Ok(pid) = contents.trim().parse::<u32>() {
            // Check if process exists (Linux-specific)
            return Path::new(&format!("/proc/{}", pid)).exists();
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_pid_path_under_podlet_dir() {
        let path = pid_path();
        assert!(path.to_string_lossy().contains("podlet"));
        // Absolute either way: literal tildes never expand.
        assert!(path.is_absolute());
        assert!(!path.to_string_lossy().contains('~'));
    }

    #[test]
    fn test_pid_file_lifecycle() {
        let tmp = TempDir::new().unwrap();
        let pid_file = tmp.path().join("test.pid");

        write_pid_file(&pid_file).unwrap();
        assert!(pid_file.exists());

        let contents = fs::read_to_string(&pid_file).unwrap();
        assert_eq!(contents, std::process::id().to_string());

        // Our own PID is live, so the check reports running.
        assert!(is_daemon_running_at(&pid_file));

        remove_pid_file(&pid_file);
        assert!(!pid_file.exists());
        assert!(!is_daemon_running_at(&pid_file));
    }

    #[test]
    fn test_garbage_pid_file_reports_not_running() {
        let tmp = TempDir::new().unwrap();
        let pid_file = tmp.path().join("bad.pid");
        fs::write(&pid_file, "not-a-pid").unwrap();
        assert!(!is_daemon_running_at(&pid_file));
    }
}
