//! Process-wide monotonic timestamp source
//!
//! The commit protocol (`filestore-engine`) requires that every transaction
//! start time, commit time, and rollback time be unique and strictly
//! increasing — not just per file, but across the whole process, since a
//! single clock is simpler to reason about than a per-file epsilon-bump
//! fallback and trivially satisfies the weaker per-file requirement too.
//!
//! Two commits landing in the same wall-clock microsecond are given
//! distinct timestamps: the clock always advances by at least one
//! microsecond over its own previous reading, regardless of what the wall
//! clock reports.

use crate::timestamp::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};

/// A shared, strictly-increasing source of [`Timestamp`]s.
///
/// Cloning a `MonotonicClock` handle (it is typically held behind an `Arc`)
/// shares the same underlying counter.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: AtomicU64,
}

impl MonotonicClock {
    /// Create a new clock with no prior readings.
    pub fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// Read the wall clock without advancing the monotonic counter.
    ///
    /// Suitable for READ_UNCOMMITTED / READ_COMMITTED reads, which only need
    /// "now", not a uniquely-ordered reading.
    pub fn now(&self) -> Timestamp {
        Timestamp::now()
    }

    /// Produce the next timestamp, guaranteed strictly greater than every
    /// timestamp this clock has ever produced before.
    ///
    /// Used for transaction start times and for commit/rollback times
    /// sampled by the commit protocol.
    pub fn next(&self) -> Timestamp {
        loop {
            let wall = Timestamp::now().as_micros();
            let prev = self.last.load(Ordering::Acquire);
            let candidate = wall.max(prev.saturating_add(1));
            if self
                .last
                .compare_exchange_weak(prev, candidate, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Timestamp::from_micros(candidate);
            }
        }
    }
}
