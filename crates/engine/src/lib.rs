//! Transaction engine
//!
//! Ties the lock manager and transaction registry (`filestore-concurrency`)
//! to the versioned file object (`filestore-storage`) via the diff codec
//! (`filestore-diff`): per-transaction read/write buffering, isolation-
//! level-driven read semantics, and the two-phase commit and compensating-
//! rollback protocols.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod engine;
mod shared;
mod transaction;

pub use config::EngineConfig;
pub use engine::TransactionEngine;
pub use shared::{share, SharedFile};
pub use transaction::Transaction;

pub use filestore_concurrency::{TransactionMetadata, TransactionStatus};
pub use filestore_core::{Error, IsolationLevel, Result};
pub use filestore_diff::{apply, diff, DiffBatch, DiffOp};
pub use filestore_storage::FileObject;
