//! Microsecond-precision timestamp type
//!
//! `Timestamp` is the unit of ordering for the whole engine: file versions,
//! transaction start times, and commit/rollback instants are all expressed
//! in it. It never exposes raw arithmetic — values only ever come from
//! [`Timestamp::now`] or [`MonotonicClock`](crate::clock::MonotonicClock).

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A point in time, measured in microseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Sentinel representing "before any real timestamp" — the initial
    /// `snapshot_time` of a file object that has never been compacted.
    pub const NEG_INFINITY: Timestamp = Timestamp(0);

    /// Read the current wall-clock time.
    ///
    /// Not guaranteed to be strictly greater than any previously observed
    /// `Timestamp` — use [`MonotonicClock`](crate::clock::MonotonicClock)
    /// when that guarantee matters (transaction start times, commit times,
    /// rollback times).
    pub fn now() -> Self {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros();
        Timestamp(micros as u64)
    }

    /// Construct a timestamp from a raw microsecond count.
    #[inline]
    pub const fn from_micros(micros: u64) -> Self {
        Timestamp(micros)
    }

    /// The raw microsecond count since the Unix epoch.
    #[inline]
    pub const fn as_micros(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}
