//! Transaction metadata registry
//!
//! A concurrent map from transaction id to its lifecycle metadata
//! (`start_time`, `end_time`, `status`). Metadata for a given transaction is
//! only ever written by that transaction's own handle — the engine's
//! `&mut Transaction` borrowing rules statically rule out two concurrent
//! writers to the same row — so the map only needs to protect its own
//! bucket structure, not individual rows, which is exactly what `DashMap`
//! provides.

use dashmap::DashMap;
use filestore_core::{Timestamp, TxnId};

/// A transaction's terminal or in-flight status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionStatus {
    /// Running; may still read, write, commit, or abort.
    Active,
    /// Committed successfully.
    Committed,
    /// Aborted by explicit client request.
    Aborted,
    /// An operation was attempted against an already-terminal transaction.
    /// Retained for API completeness; see `filestore-engine`'s guard logic
    /// for when this can actually be assigned.
    Failed,
    /// Commit materialization failed and the compensating rollback
    /// completed successfully.
    RolledBack,
    /// Commit materialization failed and the compensating rollback itself
    /// failed. The affected files are left inconsistent.
    RollbackFailed,
}

impl TransactionStatus {
    /// Whether this status is terminal — no further operations are
    /// permitted against a transaction once it reaches one of these.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, TransactionStatus::Active)
    }
}

/// A transaction's recorded lifecycle metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionMetadata {
    /// When the transaction began.
    pub start_time: Timestamp,
    /// When the transaction terminated, if it has.
    pub end_time: Option<Timestamp>,
    /// The transaction's current status.
    pub status: TransactionStatus,
}

/// Process-wide table of transaction metadata.
#[derive(Debug, Default)]
pub struct TransactionRegistry {
    rows: DashMap<TxnId, TransactionMetadata>,
}

impl TransactionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
        }
    }

    /// Record a freshly started transaction.
    ///
    /// # Panics
    ///
    /// Panics if `txn_id` already has a row — transaction ids are unique by
    /// construction (`TxnId::new` wraps a random UUID v4), so a collision
    /// here indicates a caller bug, not a runtime condition to recover
    /// from.
    pub fn create(&self, txn_id: TxnId, start_time: Timestamp) {
        let previous = self.rows.insert(
            txn_id,
            TransactionMetadata {
                start_time,
                end_time: None,
                status: TransactionStatus::Active,
            },
        );
        assert!(previous.is_none(), "transaction id {txn_id} already registered");
    }

    /// Update a transaction's status, optionally stamping its end time.
    ///
    /// If `end_time` is `None`, any end time already recorded is preserved.
    /// A no-op (beyond a log line) if `txn_id` has no row — callers are
    /// expected to have called [`create`](Self::create) first.
    pub fn update(&self, txn_id: TxnId, status: TransactionStatus, end_time: Option<Timestamp>) {
        match self.rows.get_mut(&txn_id) {
            Some(mut row) => {
                row.status = status;
                if let Some(end_time) = end_time {
                    row.end_time = Some(end_time);
                }
            }
            None => {
                tracing::warn!(%txn_id, "update() called for unregistered transaction");
            }
        }
    }

    /// Look up a transaction's current metadata.
    pub fn get(&self, txn_id: TxnId) -> Option<TransactionMetadata> {
        self.rows.get(&txn_id).map(|row| *row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(micros: u64) -> Timestamp {
        Timestamp::from_micros(micros)
    }

    #[test]
    fn create_then_get_returns_active_with_no_end_time() {
        let registry = TransactionRegistry::new();
        let txn = TxnId::new();
        registry.create(txn, t(10));
        let row = registry.get(txn).unwrap();
        assert_eq!(row.start_time, t(10));
        assert_eq!(row.end_time, None);
        assert_eq!(row.status, TransactionStatus::Active);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn create_twice_for_same_id_panics() {
        let registry = TransactionRegistry::new();
        let txn = TxnId::new();
        registry.create(txn, t(10));
        registry.create(txn, t(20));
    }

    #[test]
    fn update_preserves_end_time_when_absent() {
        let registry = TransactionRegistry::new();
        let txn = TxnId::new();
        registry.create(txn, t(10));
        registry.update(txn, TransactionStatus::Committed, Some(t(20)));
        registry.update(txn, TransactionStatus::Committed, None);
        assert_eq!(registry.get(txn).unwrap().end_time, Some(t(20)));
    }

    #[test]
    fn get_on_unknown_id_returns_none() {
        let registry = TransactionRegistry::new();
        assert!(registry.get(TxnId::new()).is_none());
    }

    #[test]
    fn terminal_statuses_report_is_terminal() {
        assert!(!TransactionStatus::Active.is_terminal());
        assert!(TransactionStatus::Committed.is_terminal());
        assert!(TransactionStatus::Aborted.is_terminal());
        assert!(TransactionStatus::Failed.is_terminal());
        assert!(TransactionStatus::RolledBack.is_terminal());
        assert!(TransactionStatus::RollbackFailed.is_terminal());
    }
}
