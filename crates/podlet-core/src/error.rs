//! Error types for the instance registry and its collaborators.

use thiserror::Error;

/// Errors produced by an [`crate::InstanceFactory`].
#[derive(Error, Debug, Clone)]
pub enum FactoryError {
    /// No constructor is registered for the requested type.
    #[error("unknown instance type '{0}'")]
    UnknownType(String),

    /// A constructor was found but failed to produce an instance.
    #[error("constructor for '{kind}' failed: {message}")]
    Construction { kind: String, message: String },
}

/// Errors reported by [`crate::InstanceRegistry::load`].
///
/// Both variants are recoverable by the caller; neither mutates registry
/// state. Failures inside an instance's `init` are logged rather than
/// reported here (see the registry docs).
#[derive(Error, Debug)]
pub enum LoadError {
    /// An instance with this name is already registered.
    #[error("an instance named '{0}' is already loaded")]
    NameConflict(String),

    /// The factory could not produce an instance of the requested type.
    #[error("failed to instantiate '{kind}': {source}")]
    Instantiation {
        kind: String,
        #[source]
        source: FactoryError,
    },
}

/// Errors an [`crate::Instance`] may raise during initialization.
#[derive(Error, Debug)]
pub enum InstanceError {
    #[error("initialization failed: {0}")]
    Init(String),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors from the callback dispatch pool.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The pool has shut down and no longer accepts work.
    #[error("dispatch pool has shut down")]
    Closed,
}
