//! JSON-RPC client over the daemon's Unix socket.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tracing::debug;

/// Parameters for loading an instance into the daemon.
#[derive(Debug, Clone, Default)]
pub struct LoadRequest {
    /// Unique name for the instance.
    pub name: String,
    /// Instance type identifier the daemon's factory resolves.
    pub kind: String,
    /// Remapping source names; zipped with `remap_targets`.
    pub remap_sources: Vec<String>,
    /// Remapping target names.
    pub remap_targets: Vec<String>,
    /// Extra arguments passed verbatim to the instance.
    pub args: Vec<String>,
}

impl LoadRequest {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            ..Self::default()
        }
    }

    fn to_params(&self) -> Value {
        json!({
            "name": self.name,
            "type": self.kind,
            "remap_sources": self.remap_sources,
            "remap_targets": self.remap_targets,
            "args": self.args,
        })
    }
}

/// Connected client for the podlet daemon.
///
/// One request in flight at a time: each call writes a JSON line and reads
/// exactly one response line.
pub struct DaemonClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    next_id: u64,
}

impl DaemonClient {
    /// Connect to a daemon socket.
    pub async fn connect(path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(path)
            .await
            .with_context(|| format!("connecting to daemon socket {}", path.display()))?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(reader),
            writer,
            next_id: 1,
        })
    }

    /// Connect to the default daemon socket.
    pub async fn connect_default() -> Result<Self> {
        Self::connect(&podlet_protocol::socket_path()).await
    }

    async fn call(&mut self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;

        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let mut line = serde_json::to_string(&request)?;
        line.push('\n');
        debug!(method, id, "sending request");
        self.writer.write_all(line.as_bytes()).await?;

        let mut response = String::new();
        let n = self.reader.read_line(&mut response).await?;
        if n == 0 {
            bail!("daemon closed the connection");
        }

        let response: Value =
            serde_json::from_str(response.trim_end()).context("parsing daemon response")?;
        if let Some(error) = response.get("error") {
            let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            bail!("daemon error {}: {}", code, message);
        }
        Ok(response.get("result").cloned().unwrap_or(Value::Null))
    }

    /// Liveness check.
    pub async fn ping(&mut self) -> Result<()> {
        let result = self.call("ping", Value::Null).await?;
        if result != json!("pong") {
            bail!("unexpected ping reply: {}", result);
        }
        Ok(())
    }

    /// Load an instance. Returns the daemon's success flag; a `false`
    /// carries the diagnostic in the log, not in this return value.
    pub async fn load(&mut self, request: &LoadRequest) -> Result<bool> {
        let result = self.call("instance.load", request.to_params()).await?;
        Ok(success_flag(&result))
    }

    /// Unload an instance by name. `false` when no such instance exists.
    pub async fn unload(&mut self, name: &str) -> Result<bool> {
        let result = self
            .call("instance.unload", json!({ "name": name }))
            .await?;
        Ok(success_flag(&result))
    }

    /// Names of all currently loaded instances.
    pub async fn list(&mut self) -> Result<Vec<String>> {
        let result = self.call("instance.list", Value::Null).await?;
        let instances = result
            .get("instances")
            .and_then(Value::as_array)
            .context("malformed instance.list response")?;
        Ok(instances
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect())
    }

    /// Unload every instance.
    pub async fn clear(&mut self) -> Result<()> {
        self.call("instance.clear", Value::Null).await?;
        Ok(())
    }

    /// Instance type identifiers the daemon can load.
    pub async fn kinds(&mut self) -> Result<Vec<String>> {
        let result = self.call("instance.kinds", Value::Null).await?;
        let kinds = result
            .get("kinds")
            .and_then(Value::as_array)
            .context("malformed instance.kinds response")?;
        Ok(kinds
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect())
    }

    /// Ask the daemon to shut down.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.call("shutdown", Value::Null).await?;
        Ok(())
    }
}

fn success_flag(result: &Value) -> bool {
    result
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}
