//! The handle type transactions exchange with their caller
//!
//! File objects are created externally (by whatever front-end sits on top
//! of this engine — a directory tree, a test harness) and outlive any one
//! transaction, so they're handed to the engine as a shared, internally
//! synchronized handle rather than owned by it.

use filestore_storage::FileObject;
use parking_lot::Mutex;
use std::sync::Arc;

/// A file object shared between however many transactions are currently
/// touching it.
///
/// One mutex guards all of a `FileObject`'s mutable state, including its
/// `active_transaction_count`: every access to it already goes through a
/// method call on this same `Mutex<FileObject>`, so a second, independently
/// synchronized counter would add ceremony without adding concurrency (see
/// DESIGN.md).
pub type SharedFile = Arc<Mutex<FileObject>>;

/// Wrap a [`FileObject`] for use with a [`TransactionEngine`](crate::engine::TransactionEngine).
pub fn share(file: FileObject) -> SharedFile {
    Arc::new(Mutex::new(file))
}
