//! Admission gate bounding how many repository tasks run at once

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Counting semaphore with observable occupancy
///
/// Cloning is cheap and every clone shares the same slots.
#[derive(Clone, Debug)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    occupancy: Arc<Occupancy>,
    capacity: usize,
}

#[derive(Debug, Default)]
struct Occupancy {
    active: AtomicUsize,
    peak: AtomicUsize,
}

/// A held slot. Dropping it (normally, on early return, or during a panic
/// unwind) hands the slot back.
#[derive(Debug)]
pub struct LimiterPermit {
    _permit: OwnedSemaphorePermit,
    occupancy: Arc<Occupancy>,
}

impl Drop for LimiterPermit {
    fn drop(&mut self) {
        self.occupancy.active.fetch_sub(1, Ordering::AcqRel);
    }
}

impl ConcurrencyLimiter {
    /// Creates a limiter with `capacity` slots (at least 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            occupancy: Arc::new(Occupancy::default()),
            capacity,
        }
    }

    /// Waits for a free slot
    pub async fn acquire(&self) -> Result<LimiterPermit, AcquireError> {
        let permit = Arc::clone(&self.semaphore).acquire_owned().await?;

        let now_active = self.occupancy.active.fetch_add(1, Ordering::AcqRel) + 1;
        self.occupancy.peak.fetch_max(now_active, Ordering::AcqRel);

        Ok(LimiterPermit {
            _permit: permit,
            occupancy: Arc::clone(&self.occupancy),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently held
    pub fn active(&self) -> usize {
        self.occupancy.active.load(Ordering::Acquire)
    }

    /// Highest number of slots held at the same time so far
    pub fn peak(&self) -> usize {
        self.occupancy.peak.load(Ordering::Acquire)
    }

    /// Stops admitting; pending and future `acquire` calls fail
    pub fn close(&self) {
        self.semaphore.close();
    }
}
