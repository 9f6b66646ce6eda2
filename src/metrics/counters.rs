//! Atomic counters for lifecycle events
//!
//! Lock-free counters that can be safely updated from any thread.

use std::sync::atomic::{AtomicU64, Ordering};

/// Lifecycle counters owned by one connection manager
#[derive(Debug, Default)]
pub struct LinkStats {
    pub connect_attempts: AtomicU64,
    pub connects: AtomicU64,
    pub connect_failures: AtomicU64,
    /// Connect calls turned away because a link existed or was being opened
    pub connects_rejected: AtomicU64,
    pub disconnects: AtomicU64,
    pub close_failures: AtomicU64,
}

impl LinkStats {
    pub const fn new() -> Self {
        Self {
            connect_attempts: AtomicU64::new(0),
            connects: AtomicU64::new(0),
            connect_failures: AtomicU64::new(0),
            connects_rejected: AtomicU64::new(0),
            disconnects: AtomicU64::new(0),
            close_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn connect_attempted(&self) {
        self.connect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn connect_succeeded(&self) {
        self.connects.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn connect_failed(&self) {
        self.connect_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn connect_rejected(&self) {
        self.connects_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn disconnected(&self) {
        self.disconnects.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn close_failed(&self) {
        self.close_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            connects: self.connects.load(Ordering::Relaxed),
            connect_failures: self.connect_failures.load(Ordering::Relaxed),
            connects_rejected: self.connects_rejected.load(Ordering::Relaxed),
            disconnects: self.disconnects.load(Ordering::Relaxed),
            close_failures: self.close_failures.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of link counters for reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub connect_attempts: u64,
    pub connects: u64,
    pub connect_failures: u64,
    pub connects_rejected: u64,
    pub disconnects: u64,
    pub close_failures: u64,
}
