//! The contract every loaded plugin instance implements.

use crate::pool::PoolHandle;
use crate::remap::RemapTable;
use crate::InstanceError;

/// Everything an instance receives at initialization, exactly once.
#[derive(Debug, Clone)]
pub struct InstanceContext {
    /// The unique name this instance was loaded under.
    pub name: String,
    /// Opaque source-to-target name remappings.
    pub remaps: RemapTable,
    /// Extra arguments forwarded verbatim from the load request.
    pub args: Vec<String>,
    /// Handle to the shared callback dispatch pool. Valid for the life of
    /// the registry that issued it.
    pub pool: PoolHandle,
}

/// A loaded unit of plugin logic.
///
/// Instances are owned exclusively by the registry from insertion until
/// erasure; teardown happens through [`Drop`] when the registry releases its
/// reference. `init` may schedule asynchronous work on `ctx.pool`, and is
/// responsible for making its own teardown safe with respect to callbacks
/// that are still running when the instance is unloaded.
pub trait Instance: Send + Sync {
    /// Initialize the instance. Called exactly once, after registration.
    ///
    /// Errors are logged by the registry; they are not reported back to the
    /// load caller and do not unregister the instance.
    fn init(&self, ctx: InstanceContext) -> Result<(), InstanceError>;
}

impl std::fmt::Debug for dyn Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Instance")
    }
}
