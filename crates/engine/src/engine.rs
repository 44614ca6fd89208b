//! The transaction engine: the library's top-level entry point
//!
//! Holds the process-wide services every transaction shares — the lock
//! manager, the transaction registry, and the monotonic clock — as
//! explicit constructor dependencies rather than hidden globals.

use crate::config::EngineConfig;
use crate::transaction::Transaction;
use filestore_concurrency::{LockManager, TransactionMetadata, TransactionRegistry};
use filestore_core::{IsolationLevel, MonotonicClock, Result, TxnId};
use std::sync::Arc;

/// Entry point for opening, committing, and aborting transactions against
/// whatever [`FileObject`](filestore_storage::FileObject)s the caller hands
/// it.
///
/// Cheap to clone (every field is an `Arc`); cloning shares the same lock
/// table, registry, and clock, which is what lets multiple threads open
/// transactions against the same engine concurrently.
#[derive(Debug, Clone)]
pub struct TransactionEngine {
    locks: Arc<LockManager>,
    registry: Arc<TransactionRegistry>,
    clock: Arc<MonotonicClock>,
    config: EngineConfig,
}

impl TransactionEngine {
    /// Build an engine with default configuration and fresh, empty
    /// services.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Build an engine with the given configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            locks: Arc::new(LockManager::new()),
            registry: Arc::new(TransactionRegistry::new()),
            clock: Arc::new(MonotonicClock::new()),
            config,
        }
    }

    /// This engine's configuration.
    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Start a new transaction at the given isolation level.
    pub fn begin(&self, isolation: IsolationLevel) -> Transaction {
        let txn_id = TxnId::new();
        let start_time = self.clock.next();
        Transaction::new(
            txn_id,
            start_time,
            isolation,
            Arc::clone(&self.locks),
            Arc::clone(&self.registry),
            Arc::clone(&self.clock),
        )
    }

    /// Start a new transaction at this engine's configured default
    /// isolation level.
    pub fn begin_default(&self) -> Transaction {
        self.begin(self.config.default_isolation)
    }

    /// Run the commit protocol on `txn`. A thin delegate to
    /// [`Transaction::commit`] kept here so callers that hold an engine
    /// handle but not a `use` of `Transaction` can still drive the whole
    /// lifecycle through one type.
    pub fn commit(&self, txn: &mut Transaction) -> Result<()> {
        txn.commit()
    }

    /// Abort `txn`. See [`commit`](Self::commit) for why this delegates.
    pub fn abort(&self, txn: &mut Transaction) -> Result<()> {
        txn.abort()
    }

    /// Look up a transaction's current metadata by id, independent of
    /// whether its `Transaction` handle is still alive.
    pub fn status(&self, txn_id: TxnId) -> Option<TransactionMetadata> {
        self.registry.get(txn_id)
    }

    /// Open a transaction at `isolation`, run `body`, and commit on
    /// `Ok`/abort on `Err` — guaranteeing termination on every exit path of
    /// `body`, including an early return or a `?`-propagated error.
    pub fn with_auto_transaction<T>(
        &self,
        isolation: IsolationLevel,
        body: impl FnOnce(&mut Transaction) -> Result<T>,
    ) -> Result<T> {
        let mut txn = self.begin(isolation);
        match body(&mut txn) {
            Ok(value) => {
                txn.commit()?;
                Ok(value)
            }
            Err(err) => {
                // abort() can itself only fail with InactiveTransaction,
                // which would mean body() already drove the transaction to
                // a terminal state (e.g. by committing then still
                // returning Err) — in that case there is nothing left to
                // undo, so the original error is what the caller needs.
                let _ = txn.abort();
                Err(err)
            }
        }
    }
}

impl Default for TransactionEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::share;
    use filestore_core::FileId;
    use filestore_diff::diff;
    use filestore_storage::FileObject;

    #[test]
    fn begin_default_uses_configured_isolation() {
        let engine = TransactionEngine::with_config(EngineConfig {
            default_isolation: IsolationLevel::ReadCommitted,
        });
        let txn = engine.begin_default();
        assert_eq!(txn.isolation(), IsolationLevel::ReadCommitted);
    }

    #[test]
    fn status_is_observable_after_commit() {
        let engine = TransactionEngine::new();
        let mut txn = engine.begin(IsolationLevel::Snapshot);
        let txn_id = txn.id();
        engine.commit(&mut txn).unwrap();
        let meta = engine.status(txn_id).unwrap();
        assert_eq!(
            meta.status,
            filestore_concurrency::TransactionStatus::Committed
        );
    }

    #[test]
    fn with_auto_transaction_commits_on_ok() {
        let engine = TransactionEngine::new();
        let file = share(FileObject::new(FileId::new(), "", engine.clock.now()));

        engine
            .with_auto_transaction(IsolationLevel::Snapshot, |txn| {
                txn.write(&file, diff("", "hello"))
            })
            .unwrap();

        assert_eq!(file.lock().read_latest().unwrap(), "hello");
    }

    #[test]
    fn with_auto_transaction_aborts_on_err() {
        let engine = TransactionEngine::new();
        let file = share(FileObject::new(FileId::new(), "", engine.clock.now()));

        let result = engine.with_auto_transaction(IsolationLevel::Snapshot, |txn| {
            txn.write(&file, diff("", "hello"))?;
            Err(filestore_core::Error::InactiveTransaction { txn_id: txn.id() })
        });

        assert!(result.is_err());
        // The write was buffered but never committed.
        assert_eq!(file.lock().read_latest().unwrap(), "");
    }
}
