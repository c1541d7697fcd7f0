//! Turning textual type identifiers into concrete instances.

use std::collections::HashMap;

use crate::error::FactoryError;
use crate::instance::Instance;

/// Result alias for factory operations.
pub type FactoryResult<T> = Result<T, FactoryError>;

/// Produces a new [`Instance`] from a type identifier.
///
/// Stateless from the registry's point of view: the registry calls
/// `instantiate` during `load` and nothing else.
pub trait InstanceFactory: Send + Sync {
    /// Construct a fresh instance of the named type.
    fn instantiate(&self, kind: &str) -> FactoryResult<Box<dyn Instance>>;

    /// The type identifiers this factory can instantiate.
    fn declared_kinds(&self) -> Vec<String>;
}

type Constructor = Box<dyn Fn() -> FactoryResult<Box<dyn Instance>> + Send + Sync>;

/// An [`InstanceFactory`] backed by a map of registered constructors.
///
/// This is the in-process stand-in for a dynamic class loader: built-in
/// instance kinds (and tests) register a constructor closure per type name.
#[derive(Default)]
pub struct ConstructorFactory {
    constructors: HashMap<String, Constructor>,
}

impl ConstructorFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor for a type name, replacing any previous one.
    pub fn register<F>(&mut self, kind: impl Into<String>, constructor: F)
    where
        F: Fn() -> FactoryResult<Box<dyn Instance>> + Send + Sync + 'static,
    {
        self.constructors.insert(kind.into(), Box::new(constructor));
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl InstanceFactory for ConstructorFactory {
    fn instantiate(&self, kind: &str) -> FactoryResult<Box<dyn Instance>> {
        match self.constructors.get(kind) {
            Some(constructor) => constructor(),
            None => Err(FactoryError::UnknownType(kind.to_string())),
        }
    }

    fn declared_kinds(&self) -> Vec<String> {
        self.constructors.keys().cloned().collect()
    }
}
