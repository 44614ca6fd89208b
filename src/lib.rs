//! # filestore
//!
//! An in-memory, multi-version, multi-isolation-level transactional store
//! for text-typed file objects. Each file is kept as a base snapshot plus
//! a time-ordered log of textual diffs; reads observe a point-in-time view
//! selected by isolation level, writes are buffered per transaction, and
//! commit materializes the buffer onto the file's version log under a
//! per-file exclusive lock. A failed commit is undone by appending a
//! compensating diff rather than rewriting history.
//!
//! ```
//! use filestore::{share, FileObject, FileId, IsolationLevel, TransactionEngine};
//!
//! let engine = TransactionEngine::new();
//! let file = share(FileObject::new(FileId::new(), "", filestore::now()));
//!
//! engine.with_auto_transaction(IsolationLevel::Snapshot, |txn| {
//!     let current = txn.read(&file)?;
//!     txn.write(&file, filestore::diff(&current, "hello"))
//! }).unwrap();
//!
//! assert_eq!(file.lock().read_latest().unwrap(), "hello");
//! ```
//!
//! This crate is the engine's core only: the hierarchical directory tree
//! that resolves paths and offers `ls`/`cd`/`mkdir`/`mv`/`rm`, the
//! interactive console, and durability to disk are external collaborators
//! layered on top, not part of this library.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use filestore_core::{FileId, Timestamp, TxnId};
pub use filestore_diff::{apply, diff, DiffBatch, DiffOp};
pub use filestore_engine::{
    share, EngineConfig, Error, IsolationLevel, Result, SharedFile, Transaction,
    TransactionEngine, TransactionMetadata, TransactionStatus,
};
pub use filestore_storage::FileObject;

/// The current wall-clock time, for constructing a [`FileObject`] outside
/// of any transaction (e.g. when a directory layer first creates a file).
pub fn now() -> Timestamp {
    Timestamp::now()
}
