//! Fetch concurrency limiting
//!
//! A counting semaphore shared by every branch of one crawl. Waiters are served
//! in arrival order (tokio's semaphore is fair), and a permit is returned
//! exactly once when its guard is dropped, on success and failure alike.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounds the number of fetches in flight
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// A held fetch slot; the slot is released when this guard is dropped
#[derive(Debug)]
pub struct FetchPermit {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyLimiter {
    /// Creates a limiter with `capacity` permits
    ///
    /// A capacity of zero would deadlock every acquire, so it is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Waits for a free slot
    ///
    /// Suspends only the calling task. Waiters are admitted first come, first
    /// served.
    pub async fn acquire(&self) -> FetchPermit {
        let permit = match self.semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => unreachable!("limiter semaphore is never closed"),
        };
        FetchPermit { _permit: permit }
    }

    /// Total number of permits
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Permits currently held
    pub fn in_flight(&self) -> usize {
        self.capacity - self.available()
    }
}
