//! Dispatches connection tasks without blocking the accept loop.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;

/// Upper bound on concurrently running connection tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WorkerLimit {
    #[default]
    Unbounded,
    Bounded(usize),
}

impl WorkerLimit {
    /// `0` means unbounded.
    pub fn from_count(count: usize) -> Self {
        match count {
            0 => WorkerLimit::Unbounded,
            n => WorkerLimit::Bounded(n),
        }
    }
}

/// Spawns one tokio task per job. With a bound, each task waits for a
/// semaphore permit before running, so the caller never waits.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Option<Arc<Semaphore>>,
    in_flight: Arc<AtomicUsize>,
}

impl WorkerPool {
    pub fn new(limit: WorkerLimit) -> Self {
        let permits = match limit {
            WorkerLimit::Unbounded => None,
            WorkerLimit::Bounded(n) => Some(Arc::new(Semaphore::new(n.max(1)))),
        };

        Self {
            permits,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Tasks dispatched and not yet finished, including those waiting for a permit.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn dispatch<F>(&self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permits = self.permits.clone();
        let guard = InFlight::enter(self.in_flight.clone());

        tokio::spawn(async move {
            let _guard = guard;
            let _permit = match permits {
                Some(semaphore) => match semaphore.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    // The semaphore is never closed.
                    Err(_) => return,
                },
                None => None,
            };
            job.await;
        });
    }
}

/// Counts a task as in flight until dropped, including on panic.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}
