//! Built-in instance kinds.
//!
//! These play the role a plugin library would in a full deployment: they are
//! registered into the daemon's factory at startup, exercise the whole
//! `Instance` contract (context, remappings, pool dispatch), and give the
//! integration tests real types to load.

use podlet_core::{ConstructorFactory, Instance, InstanceContext, InstanceError};
use tracing::{debug, info};

/// Register every built-in kind into the factory.
pub fn register(factory: &mut ConstructorFactory) {
    factory.register("echo", || Ok(Box::new(Echo)));
    factory.register("null", || Ok(Box::new(Null)));
}

/// Logs its init context, then echoes each argument from a pool callback.
struct Echo;

impl Instance for Echo {
    fn init(&self, ctx: InstanceContext) -> Result<(), InstanceError> {
        info!(
            name = %ctx.name,
            remaps = ctx.remaps.len(),
            args = ctx.args.len(),
            "echo instance starting"
        );
        for (source, target) in ctx.remaps.iter() {
            debug!(name = %ctx.name, source, target, "remapping");
        }

        let name = ctx.name.clone();
        for arg in ctx.args {
            let name = name.clone();
            ctx.pool.enqueue(move || {
                info!(name = %name, arg = %arg, "echo");
            })?;
        }
        Ok(())
    }
}

/// Does nothing. Useful as a load/unload fixture.
struct Null;

impl Instance for Null {
    fn init(&self, ctx: InstanceContext) -> Result<(), InstanceError> {
        debug!(name = %ctx.name, "null instance initialized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use podlet_core::{DispatchPool, RemapTable};

    #[test]
    fn registers_builtin_kinds() {
        let mut factory = ConstructorFactory::new();
        register(&mut factory);

        let mut kinds = podlet_core::InstanceFactory::declared_kinds(&factory);
        kinds.sort();
        assert_eq!(kinds, vec!["echo".to_string(), "null".to_string()]);
    }

    #[test]
    fn echo_init_dispatches_args_on_the_pool() {
        let pool = DispatchPool::new(Some(1));
        let ctx = InstanceContext {
            name: "echo-test".to_string(),
            remaps: RemapTable::new(),
            args: vec!["one".to_string(), "two".to_string()],
            pool: pool.handle(),
        };
        Echo.init(ctx).unwrap();
        // Dropping the pool drains the queued echoes.
        drop(pool);
    }

    #[test]
    fn null_init_is_infallible() {
        let pool = DispatchPool::new(Some(1));
        let ctx = InstanceContext {
            name: "null-test".to_string(),
            remaps: RemapTable::new(),
            args: Vec::new(),
            pool: pool.handle(),
        };
        assert!(Null.init(ctx).is_ok());
    }
}
