//! Hardware timer pool for tone channels
//!
//! Hands out exclusive timer ids from a fixed pool. The ESP32-S2 has two
//! timer groups with two timers each, so the firmware pool holds four.
//! Ids are returned to the pool when their lease is dropped.

use core::sync::atomic::{AtomicU8, Ordering};

use super::tone::ToneError;

/// Timers available on the ESP32-S2 (TIMG0/TIMG1 x 2)
pub const MAX_TIMERS: u8 = 4;

/// General-purpose hardware timer id (0 .. MAX_TIMERS)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u8);

impl TimerId {
    /// Raw id
    #[inline]
    pub fn index(self) -> u8 {
        self.0
    }

    /// Timer group (0 or 1)
    #[inline]
    pub fn group(self) -> u8 {
        self.0 / 2
    }

    /// Timer index inside its group (0 or 1)
    #[inline]
    pub fn timer(self) -> u8 {
        self.0 % 2
    }
}

/// Pool of timer ids, tracked as a bitmask of ids in use
pub struct TimerPool {
    used: AtomicU8,
    capacity: u8,
}

impl TimerPool {
    /// Create a pool of `capacity` timers (at most 8)
    pub const fn new(capacity: u8) -> Self {
        assert!(capacity <= 8, "Timer pool is tracked in a u8 bitmask");
        Self {
            used: AtomicU8::new(0),
            capacity,
        }
    }

    /// Total number of timers managed by the pool
    #[inline]
    pub fn capacity(&self) -> u8 {
        self.capacity
    }

    /// Number of ids currently leased
    #[inline]
    pub fn in_use(&self) -> u8 {
        self.used.load(Ordering::Acquire).count_ones() as u8
    }

    /// Lease the lowest free timer id
    ///
    /// Fails with `NoTimerAvailable` once every id is leased.
    pub fn allocate(&self) -> Result<TimerLease<'_>, ToneError> {
        let mut current = self.used.load(Ordering::Acquire);
        loop {
            let free = (0..self.capacity).find(|id| current & (1 << id) == 0);
            let Some(id) = free else {
                return Err(ToneError::NoTimerAvailable);
            };

            match self.used.compare_exchange_weak(
                current,
                current | (1 << id),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    return Ok(TimerLease {
                        pool: self,
                        id: TimerId(id),
                    })
                }
                Err(actual) => current = actual,
            }
        }
    }

    fn release(&self, id: TimerId) {
        self.used.fetch_and(!(1 << id.0), Ordering::AcqRel);
    }
}

/// Exclusive claim on one timer id; the id goes back to the pool on drop
#[derive(Debug)]
pub struct TimerLease<'p> {
    pool: &'p TimerPool,
    id: TimerId,
}

impl TimerLease<'_> {
    /// Leased timer id
    #[inline]
    pub fn id(&self) -> TimerId {
        self.id
    }
}

impl Drop for TimerLease<'_> {
    fn drop(&mut self) {
        self.pool.release(self.id);
    }
}

impl core::fmt::Debug for TimerPool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TimerPool")
            .field("capacity", &self.capacity)
            .field("in_use", &self.in_use())
            .finish()
    }
}
