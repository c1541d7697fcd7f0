//! The instance registry: a uniquely-named map of live plugin instances.
//!
//! The registry owns every instance's lifetime from insertion until erasure,
//! and owns the callback dispatch pool whose handle it injects into every
//! instance at init. All operations are linearizable with respect to one
//! another: a single mutex guards the map for whole check-and-insert, erase,
//! and snapshot operations. The lock is never held across an instance's
//! `init`, so a slow plugin startup cannot block unrelated loads, unloads,
//! or listings.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::LoadError;
use crate::factory::InstanceFactory;
use crate::instance::{Instance, InstanceContext};
use crate::pool::{DispatchPool, PoolHandle};
use crate::remap::RemapTable;

/// Process-local registry of loaded plugin instances.
pub struct InstanceRegistry {
    // `instances` is declared before `pool` so instances (and any pool
    // handles they hold) drop before the pool joins its workers.
    instances: Mutex<HashMap<String, Arc<dyn Instance>>>,
    factory: Arc<dyn InstanceFactory>,
    pool: DispatchPool,
}

impl InstanceRegistry {
    /// Create a registry with a freshly sized dispatch pool.
    ///
    /// `worker_threads` is resolved exactly once, here: an explicit count if
    /// configured, otherwise the pool's default. The resulting pool handle
    /// is immutable for the registry's lifetime.
    pub fn new(factory: Arc<dyn InstanceFactory>, worker_threads: Option<usize>) -> Self {
        Self::with_pool(factory, DispatchPool::new(worker_threads))
    }

    /// Create a registry around an externally constructed pool.
    pub fn with_pool(factory: Arc<dyn InstanceFactory>, pool: DispatchPool) -> Self {
        debug!(
            kinds = factory.declared_kinds().len(),
            workers = pool.worker_count(),
            "instance registry created"
        );
        Self {
            instances: Mutex::new(HashMap::new()),
            factory,
            pool,
        }
    }

    /// Load a new instance under a unique name.
    ///
    /// Fails without side effects if `name` is taken or the factory cannot
    /// produce an instance of `kind`. On success the record is inserted
    /// before `init` runs, and the map lock is released first, so a failing
    /// or slow `init` leaves the instance registered (but uninitialized) and
    /// discoverable for a diagnostic [`unload`](Self::unload). `init`
    /// failures are logged, not reported back, and are not rolled back.
    pub fn load(
        &self,
        name: &str,
        kind: &str,
        remaps: RemapTable,
        args: Vec<String>,
    ) -> Result<(), LoadError> {
        let instance = {
            let mut instances = self.instances.lock();
            if instances.contains_key(name) {
                return Err(LoadError::NameConflict(name.to_string()));
            }

            let instance: Arc<dyn Instance> = match self.factory.instantiate(kind) {
                Ok(instance) => Arc::from(instance),
                Err(source) => {
                    return Err(LoadError::Instantiation {
                        kind: kind.to_string(),
                        source,
                    })
                }
            };
            instances.insert(name.to_string(), instance.clone());
            instance
        };
        debug!(name, kind, "instance registered");

        let ctx = InstanceContext {
            name: name.to_string(),
            remaps,
            args,
            pool: self.pool.handle(),
        };
        if let Err(e) = instance.init(ctx) {
            warn!(name, kind, error = %e, "instance init failed, leaving it registered but uninitialized");
        } else {
            debug!(name, "instance initialized");
        }
        Ok(())
    }

    /// Remove an instance, releasing the registry's ownership of it.
    ///
    /// Returns `false` when no instance with that name exists; this is a
    /// reported failure, not a fatal one. The call never waits for the
    /// instance's outstanding pool callbacks to drain.
    pub fn unload(&self, name: &str) -> bool {
        // Take the record out under the lock, drop it after.
        let removed = self.instances.lock().remove(name);
        match removed {
            Some(_) => {
                debug!(name, "instance unloaded");
                true
            }
            None => {
                warn!(name, "no instance with that name to unload");
                false
            }
        }
    }

    /// Snapshot of currently registered names, in no particular order.
    pub fn list(&self) -> Vec<String> {
        self.instances.lock().keys().cloned().collect()
    }

    /// Unload everything. Always succeeds; used at process teardown.
    pub fn clear(&self) -> bool {
        let drained: Vec<_> = {
            let mut instances = self.instances.lock();
            instances.drain().collect()
        };
        if !drained.is_empty() {
            debug!(count = drained.len(), "registry cleared");
        }
        // Instance teardown runs here, outside the lock.
        drop(drained);
        true
    }

    pub fn len(&self) -> usize {
        self.instances.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.lock().is_empty()
    }

    /// Worker-thread count of the pool this registry owns.
    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    /// Type identifiers the underlying factory can instantiate.
    pub fn declared_kinds(&self) -> Vec<String> {
        self.factory.declared_kinds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FactoryError, InstanceError};
    use crate::factory::ConstructorFactory;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    /// Counts inits and drops so tests can observe lifecycle transitions.
    struct Probe {
        inits: Arc<AtomicUsize>,
        drops: Arc<AtomicUsize>,
        fail_init: bool,
    }

    impl Instance for Probe {
        fn init(&self, _ctx: InstanceContext) -> Result<(), InstanceError> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            if self.fail_init {
                return Err(InstanceError::Init("probe told to fail".to_string()));
            }
            Ok(())
        }
    }

    impl Drop for Probe {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Fixture {
        inits: Arc<AtomicUsize>,
        drops: Arc<AtomicUsize>,
        registry: InstanceRegistry,
    }

    fn fixture() -> Fixture {
        let inits = Arc::new(AtomicUsize::new(0));
        let drops = Arc::new(AtomicUsize::new(0));

        let mut factory = ConstructorFactory::new();
        {
            let (inits, drops) = (inits.clone(), drops.clone());
            factory.register("probe", move || {
                Ok(Box::new(Probe {
                    inits: inits.clone(),
                    drops: drops.clone(),
                    fail_init: false,
                }))
            });
        }
        {
            let (inits, drops) = (inits.clone(), drops.clone());
            factory.register("probe-bad-init", move || {
                Ok(Box::new(Probe {
                    inits: inits.clone(),
                    drops: drops.clone(),
                    fail_init: true,
                }))
            });
        }
        factory.register("unbuildable", || {
            Err(FactoryError::Construction {
                kind: "unbuildable".to_string(),
                message: "constructor refused".to_string(),
            })
        });

        Fixture {
            inits,
            drops,
            registry: InstanceRegistry::new(Arc::new(factory), Some(2)),
        }
    }

    #[test]
    fn loaded_name_appears_exactly_once_in_list() {
        let f = fixture();
        f.registry
            .load("a", "probe", RemapTable::new(), Vec::new())
            .unwrap();

        let listed = f.registry.list();
        assert_eq!(listed, vec!["a".to_string()]);
        assert_eq!(f.inits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn duplicate_load_keeps_first_instance() {
        let f = fixture();
        f.registry
            .load("a", "probe", RemapTable::new(), Vec::new())
            .unwrap();

        let err = f
            .registry
            .load("a", "probe", RemapTable::new(), Vec::new())
            .unwrap_err();
        assert!(matches!(err, LoadError::NameConflict(name) if name == "a"));

        // First instance untouched: one init, no teardown, still listed once.
        assert_eq!(f.inits.load(Ordering::SeqCst), 1);
        assert_eq!(f.drops.load(Ordering::SeqCst), 0);
        assert_eq!(f.registry.list(), vec!["a".to_string()]);
    }

    #[test]
    fn unknown_type_fails_without_state_change() {
        let f = fixture();
        let err = f
            .registry
            .load("a", "no-such-kind", RemapTable::new(), Vec::new())
            .unwrap_err();
        assert!(matches!(
            err,
            LoadError::Instantiation {
                source: FactoryError::UnknownType(_),
                ..
            }
        ));
        assert!(f.registry.is_empty());
    }

    #[test]
    fn failing_constructor_fails_without_state_change() {
        let f = fixture();
        let err = f
            .registry
            .load("a", "unbuildable", RemapTable::new(), Vec::new())
            .unwrap_err();
        assert!(matches!(
            err,
            LoadError::Instantiation {
                source: FactoryError::Construction { .. },
                ..
            }
        ));
        assert!(f.registry.is_empty());
        assert_eq!(f.inits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failing_init_leaves_instance_registered() {
        let f = fixture();
        f.registry
            .load("a", "probe-bad-init", RemapTable::new(), Vec::new())
            .unwrap();

        // Registered but uninitialized: discoverable and unloadable.
        assert_eq!(f.registry.list(), vec!["a".to_string()]);
        assert!(f.registry.unload("a"));
        assert_eq!(f.drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unload_of_unknown_name_fails_and_leaves_list_unchanged() {
        let f = fixture();
        f.registry
            .load("a", "probe", RemapTable::new(), Vec::new())
            .unwrap();

        assert!(!f.registry.unload("never-loaded"));
        assert_eq!(f.registry.list(), vec!["a".to_string()]);
    }

    #[test]
    fn unload_releases_ownership() {
        let f = fixture();
        f.registry
            .load("a", "probe", RemapTable::new(), Vec::new())
            .unwrap();

        assert!(f.registry.unload("a"));
        assert_eq!(f.drops.load(Ordering::SeqCst), 1);
        assert!(f.registry.is_empty());
    }

    #[test]
    fn clear_always_empties_the_registry() {
        let f = fixture();
        assert!(f.registry.clear()); // clearing an empty registry succeeds

        for name in ["a", "b", "c"] {
            f.registry
                .load(name, "probe", RemapTable::new(), Vec::new())
                .unwrap();
        }
        assert!(f.registry.clear());
        assert!(f.registry.list().is_empty());
        assert_eq!(f.drops.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn name_is_reusable_after_unload() {
        let f = fixture();
        f.registry
            .load("a", "probe", RemapTable::new(), Vec::new())
            .unwrap();
        assert!(f.registry.unload("a"));
        f.registry
            .load("a", "probe", RemapTable::new(), Vec::new())
            .unwrap();

        assert_eq!(f.registry.list(), vec!["a".to_string()]);
        assert_eq!(f.inits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn concurrent_loads_with_distinct_names_all_land() {
        let f = fixture();
        let registry = Arc::new(f.registry);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let registry = registry.clone();
                thread::spawn(move || {
                    registry
                        .load(&format!("inst-{i}"), "probe", RemapTable::new(), Vec::new())
                        .is_ok()
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }

        let mut listed = registry.list();
        listed.sort();
        let mut expected: Vec<_> = (0..16).map(|i| format!("inst-{i}")).collect();
        expected.sort();
        assert_eq!(listed, expected);
    }

    #[test]
    fn concurrent_loads_on_one_name_admit_exactly_one() {
        let f = fixture();
        let registry = Arc::new(f.registry);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || {
                    registry
                        .load("contested", "probe", RemapTable::new(), Vec::new())
                        .is_ok()
                })
            })
            .collect();
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(wins, 1);
        assert_eq!(registry.list(), vec!["contested".to_string()]);
        assert_eq!(f.inits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn init_receives_name_remaps_args_and_pool() {
        struct CtxCheck;
        impl Instance for CtxCheck {
            fn init(&self, ctx: InstanceContext) -> Result<(), InstanceError> {
                assert_eq!(ctx.name, "checked");
                assert_eq!(ctx.remaps.resolve("in"), Some("out"));
                assert_eq!(ctx.args, vec!["--flag".to_string()]);
                // The pool handle must be live at init time.
                ctx.pool.enqueue(|| {})?;
                Ok(())
            }
        }

        let mut factory = ConstructorFactory::new();
        factory.register("ctx-check", || Ok(Box::new(CtxCheck)));
        let registry = InstanceRegistry::new(Arc::new(factory), Some(1));

        let mut remaps = RemapTable::new();
        remaps.insert("in", "out");
        registry
            .load("checked", "ctx-check", remaps, vec!["--flag".to_string()])
            .unwrap();
        assert_eq!(registry.len(), 1);
    }
}
