//! Shared types for the filestore engine
//!
//! This crate defines the foundational primitives used throughout the
//! transactional file store: opaque ids, the monotonic timestamp type, the
//! process-wide monotonic clock, isolation levels, and the unified error
//! type. Every other crate in the workspace depends on this one and nothing
//! else upstream of it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod error;
pub mod ids;
pub mod isolation;
pub mod timestamp;

pub use clock::MonotonicClock;
pub use error::{Error, Result};
pub use ids::{FileId, TxnId};
pub use isolation::IsolationLevel;
pub use timestamp::Timestamp;
