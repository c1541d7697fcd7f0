//! Shared callback dispatch pool.
//!
//! Every loaded instance schedules its asynchronous callback work on one
//! bounded set of worker threads owned by the registry, so plugins do not
//! need dedicated threads of their own. The registry hands each instance a
//! [`PoolHandle`] at init time and takes no further part in dispatch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, trace};

use crate::error::PoolError;

/// A unit of callback work executed on a pool worker.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

enum Message {
    Run(Job),
    Shutdown,
}

/// Cheaply cloneable handle for enqueuing work on the pool.
///
/// Handles are valid for the lifetime of the pool that issued them; once the
/// pool shuts down, [`PoolHandle::enqueue`] reports [`PoolError::Closed`].
#[derive(Clone)]
pub struct PoolHandle {
    tx: flume::Sender<Message>,
    closed: Arc<AtomicBool>,
}

impl PoolHandle {
    /// Queue a callback for execution on one of the pool's workers.
    pub fn enqueue<F>(&self, job: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.closed.load(Ordering::Acquire) {
            return Err(PoolError::Closed);
        }
        self.tx
            .send(Message::Run(Box::new(job)))
            .map_err(|_| PoolError::Closed)
    }

    /// Number of callbacks queued but not yet picked up by a worker.
    pub fn pending(&self) -> usize {
        self.tx.len()
    }
}

impl std::fmt::Debug for PoolHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolHandle")
            .field("pending", &self.tx.len())
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish()
    }
}

/// Bounded pool of worker threads shared by all loaded instances.
///
/// Dropping the pool stops accepting new work, lets the workers drain
/// whatever is already queued, then joins them.
pub struct DispatchPool {
    handle: PoolHandle,
    workers: Vec<JoinHandle<()>>,
}

impl DispatchPool {
    /// Create a pool with the given worker count, or an implementation
    /// default (`num_cpus::get()`) when none is configured.
    ///
    /// The sizing decision is made exactly once here; the pool is never
    /// resized afterwards.
    pub fn new(worker_threads: Option<usize>) -> Self {
        let count = worker_threads.unwrap_or_else(num_cpus::get).max(1);
        let (tx, rx) = flume::unbounded::<Message>();

        let workers = (0..count)
            .map(|i| {
                let rx = rx.clone();
                thread::Builder::new()
                    .name(format!("podlet-dispatch-{i}"))
                    .spawn(move || {
                        while let Ok(message) = rx.recv() {
                            match message {
                                Message::Run(job) => job(),
                                Message::Shutdown => break,
                            }
                        }
                        trace!(worker = i, "dispatch worker exiting");
                    })
                    .expect("failed to spawn dispatch worker thread")
            })
            .collect();

        debug!(workers = count, "dispatch pool started");
        Self {
            handle: PoolHandle {
                tx,
                closed: Arc::new(AtomicBool::new(false)),
            },
            workers,
        }
    }

    /// Shared handle to pass to instances at init.
    pub fn handle(&self) -> PoolHandle {
        self.handle.clone()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for DispatchPool {
    fn drop(&mut self) {
        self.handle.closed.store(true, Ordering::Release);

        // One sentinel per worker, queued behind any outstanding jobs so
        // already-enqueued callbacks still run.
        for _ in 0..self.workers.len() {
            let _ = self.handle.tx.send(Message::Shutdown);
        }
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        debug!("dispatch pool stopped");
    }
}
