//! Per-file locking and transaction bookkeeping
//!
//! These two services are process-wide and shared by every transaction the
//! engine runs; `filestore-engine` takes them as explicit constructor
//! dependencies (held behind `Arc`) rather than reaching for a global.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod lock;
mod registry;

pub use lock::{LockManager, LockMode};
pub use registry::{TransactionMetadata, TransactionRegistry, TransactionStatus};
