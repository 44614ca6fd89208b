//! Unified error type for the filestore engine
//!
//! Every fallible operation across every crate in the workspace returns
//! [`Result<T>`], whose error variant is this single enum. Each variant
//! carries enough structured context to act on without parsing a message
//! string.

use crate::ids::{FileId, TxnId};
use crate::isolation::IsolationLevel;
use thiserror::Error;

/// Result type alias used throughout the filestore engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the filestore engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A diff operation referenced an index outside the bounds of the
    /// string it was applied to. Indicates a codec or caller bug, not a
    /// transient condition — not recoverable by retrying.
    #[error("invalid diff index: start={start}, end={end:?}, content length={len}")]
    InvalidIndex {
        /// The operation's `start` index.
        start: i64,
        /// The operation's `end` index, if it had one (`Insert` has none).
        end: Option<i64>,
        /// Length (in `char`s) of the content the operation was applied to.
        len: usize,
    },

    /// A transaction could not acquire a lock it needed. Recoverable: the
    /// client may retry the whole transaction or abort it.
    #[error("lock conflict on file {file_id} for transaction {txn_id}")]
    LockConflict {
        /// The file the lock was requested on.
        file_id: FileId,
        /// The transaction that failed to acquire the lock.
        txn_id: TxnId,
    },

    /// `write` was called on a transaction whose isolation level forbids
    /// writes. Recoverable: begin a new transaction at `Snapshot`.
    #[error("write not permitted at isolation level {isolation:?}")]
    WriteNotPermittedAtIsolation {
        /// The isolation level the transaction was running at.
        isolation: IsolationLevel,
    },

    /// An operation was attempted on a transaction that has already
    /// terminated. Not recoverable for this handle: start a new
    /// transaction.
    #[error("transaction {txn_id} is not active")]
    InactiveTransaction {
        /// The transaction the operation was attempted against.
        txn_id: TxnId,
    },

    /// Materializing a buffered write during commit failed after some
    /// files may already have been updated. The engine has already run the
    /// rollback protocol over everything it touched before this error is
    /// returned to the caller.
    #[error("commit failed for transaction {txn_id}: {reason}")]
    CommitFailed {
        /// The transaction whose commit failed.
        txn_id: TxnId,
        /// Human-readable description of the underlying failure.
        reason: String,
    },

    /// The compensating rollback issued after a failed commit itself
    /// failed. The affected files are left in an inconsistent state;
    /// not recoverable without external intervention.
    #[error("critical: rollback failed for transaction {txn_id}: {reason}")]
    Critical {
        /// The transaction whose rollback failed.
        txn_id: TxnId,
        /// Human-readable description of the rollback failure.
        reason: String,
    },
}

impl Error {
    /// Whether a client can meaningfully retry the operation that produced
    /// this error (as opposed to starting over with a new transaction, or
    /// escalating to an operator).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::LockConflict { .. })
    }
}
