//! Core of the podlet plugin host.
//!
//! A podlet process hosts many independently loaded plugin instances in one
//! address space. This crate owns the pieces with real invariants:
//!
//! - [`InstanceRegistry`] — the uniquely-named map of live instances and its
//!   load/unload/list/clear lifecycle protocol
//! - [`DispatchPool`] — the bounded worker-thread pool every instance shares
//!   for its asynchronous callback work
//! - [`Instance`] / [`InstanceFactory`] — the contracts plugins and their
//!   constructors implement
//!
//! The network control surface lives in `podlet-daemon`; this crate is
//! transport-agnostic.

pub mod error;
pub mod factory;
pub mod instance;
pub mod pool;
pub mod registry;
pub mod remap;

pub use error::{FactoryError, InstanceError, LoadError, PoolError};
pub use factory::{ConstructorFactory, InstanceFactory};
pub use instance::{Instance, InstanceContext};
pub use pool::{DispatchPool, PoolHandle};
pub use registry::InstanceRegistry;
pub use remap::RemapTable;
