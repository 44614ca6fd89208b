//! A single transaction's read/write buffering and commit/rollback protocol
//!
//! A `Transaction` owns nothing durable — only its in-memory modification
//! buffer and a handle to the process-wide services (lock manager,
//! registry, clock) it was built with. Its `&mut self` methods statically
//! rule out two operations being in flight on the same transaction at once
//! (see DESIGN.md); every method still begins with an active-status check,
//! since a handle can be reused after it has already terminated.

use crate::shared::SharedFile;
use filestore_concurrency::{LockManager, LockMode, TransactionRegistry, TransactionStatus};
use filestore_core::{Error, FileId, IsolationLevel, MonotonicClock, Result, Timestamp, TxnId};
use filestore_diff::{apply, DiffBatch};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug)]
struct FileTouch {
    file: SharedFile,
    batches: Vec<DiffBatch>,
}

/// An in-flight (or just-terminated) unit of work against one or more
/// [`FileObject`](filestore_storage::FileObject)s.
///
/// Obtained from [`TransactionEngine::begin`](crate::engine::TransactionEngine::begin).
#[derive(Debug)]
pub struct Transaction {
    id: TxnId,
    start_time: Timestamp,
    isolation: IsolationLevel,
    status: TransactionStatus,
    touched: HashMap<FileId, FileTouch>,
    locks: Arc<LockManager>,
    registry: Arc<TransactionRegistry>,
    clock: Arc<MonotonicClock>,
}

impl Transaction {
    pub(crate) fn new(
        id: TxnId,
        start_time: Timestamp,
        isolation: IsolationLevel,
        locks: Arc<LockManager>,
        registry: Arc<TransactionRegistry>,
        clock: Arc<MonotonicClock>,
    ) -> Self {
        registry.create(id, start_time);
        tracing::info!(%id, ?isolation, "transaction begin");
        Self {
            id,
            start_time,
            isolation,
            status: TransactionStatus::Active,
            touched: HashMap::new(),
            locks,
            registry,
            clock,
        }
    }

    /// This transaction's identity.
    pub fn id(&self) -> TxnId {
        self.id
    }

    /// The isolation level this transaction was started at.
    pub fn isolation(&self) -> IsolationLevel {
        self.isolation
    }

    /// When this transaction began.
    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    /// This transaction's locally cached status.
    ///
    /// Always consistent with the registry's row for this transaction,
    /// since only this handle ever writes to it (`&mut self` rules out a
    /// concurrent writer). Use
    /// [`TransactionEngine::status`](crate::engine::TransactionEngine::status)
    /// to look a transaction up by id from elsewhere.
    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    /// Confirm this transaction may still run an operation.
    ///
    /// `&mut self` on every public method already rules out two operations
    /// racing on the same handle, so `self.status` can never actually have
    /// drifted from the registry's row for this id. The cross-check against
    /// the registry below is defensive, not load-bearing: if it ever did
    /// find a mismatch, that would mean this handle's local cache is stale
    /// relative to the source of truth, which this marks as `Failed` rather
    /// than trusting either value blindly.
    fn check_active(&mut self) -> Result<()> {
        if self.status != TransactionStatus::Active {
            return Err(Error::InactiveTransaction { txn_id: self.id });
        }
        if let Some(row) = self.registry.get(self.id) {
            if row.status.is_terminal() {
                self.status = TransactionStatus::Failed;
                self.registry
                    .update(self.id, TransactionStatus::Failed, None);
                return Err(Error::InactiveTransaction { txn_id: self.id });
            }
        }
        Ok(())
    }

    /// First-touch bookkeeping: register the file in the touched set (and
    /// bracket `increment_active`) if this is the first time this
    /// transaction has read or written it.
    fn touch(&mut self, file: &SharedFile) -> FileId {
        let file_id = file.lock().id();
        self.touched.entry(file_id).or_insert_with(|| {
            file.lock().increment_active();
            FileTouch {
                file: Arc::clone(file),
                batches: Vec::new(),
            }
        });
        file_id
    }

    /// The timestamp a read against this transaction should use as its
    /// baseline: the transaction's start time under snapshot isolation,
    /// wall-clock "now" otherwise.
    fn baseline_time(&self) -> Timestamp {
        match self.isolation {
            IsolationLevel::Snapshot => self.start_time,
            IsolationLevel::ReadCommitted | IsolationLevel::ReadUncommitted => self.clock.now(),
        }
    }

    /// Read a file's content as this transaction currently sees it: the
    /// isolation-level baseline with any of this transaction's own buffered
    /// writes to the file layered on top.
    pub fn read(&mut self, file: &SharedFile) -> Result<String> {
        self.check_active()?;
        let file_id = self.touch(file);
        let at = self.baseline_time();

        let baseline = if self.isolation.reads_under_shared_lock() {
            if !self.locks.acquire(file_id, self.id, LockMode::Shared) {
                tracing::warn!(txn_id = %self.id, ?file_id, "read lock conflict");
                return Err(Error::LockConflict {
                    file_id,
                    txn_id: self.id,
                });
            }
            let result = file.lock().read_at(at);
            self.locks.release(file_id, self.id);
            result?
        } else {
            file.lock().read_at(at)?
        };

        let touch = self
            .touched
            .get(&file_id)
            .expect("touch() was just called for this file_id");
        let mut content = baseline;
        for batch in &touch.batches {
            content = apply(&content, batch)?;
        }
        Ok(content)
    }

    /// Buffer a write against a file. Not visible to any other transaction,
    /// and not persisted to the file object, until this transaction
    /// commits. Locks are not acquired here — write/write contention is
    /// resolved entirely at commit time.
    pub fn write(&mut self, file: &SharedFile, batch: DiffBatch) -> Result<()> {
        self.check_active()?;
        if !self.isolation.permits_writes() {
            return Err(Error::WriteNotPermittedAtIsolation {
                isolation: self.isolation,
            });
        }
        let file_id = self.touch(file);
        if !batch.is_empty() {
            self.touched
                .get_mut(&file_id)
                .expect("touch() was just called for this file_id")
                .batches
                .push(batch);
        }
        Ok(())
    }

    /// Run the commit protocol: acquire exclusive locks on every written
    /// file in ascending file-id order, materialize each buffered diff
    /// chain, and finalize. On a materialization failure, runs the
    /// compensating rollback protocol before surfacing `CommitFailed`.
    pub fn commit(&mut self) -> Result<()> {
        self.check_active()?;

        let mut write_ids: Vec<FileId> = self
            .touched
            .iter()
            .filter(|(_, touch)| !touch.batches.is_empty())
            .map(|(file_id, _)| *file_id)
            .collect();
        write_ids.sort();

        if write_ids.is_empty() {
            tracing::info!(txn_id = %self.id, "commit: no writes buffered, trivially committed");
            self.finalize(TransactionStatus::Committed);
            return Ok(());
        }

        let mut acquired = Vec::with_capacity(write_ids.len());
        for &file_id in &write_ids {
            if self.locks.acquire(file_id, self.id, LockMode::Exclusive) {
                acquired.push(file_id);
            } else {
                tracing::warn!(txn_id = %self.id, ?file_id, "commit: exclusive lock conflict");
                for held in acquired.iter().rev() {
                    self.locks.release(*held, self.id);
                }
                return Err(Error::LockConflict {
                    file_id,
                    txn_id: self.id,
                });
            }
        }

        let commit_time = self.clock.next();
        let mut rollback_log: Vec<(SharedFile, Timestamp, Timestamp)> =
            Vec::with_capacity(write_ids.len());
        let mut failure: Option<Error> = None;

        for &file_id in &write_ids {
            let touch = &self.touched[&file_id];
            match materialize_and_commit(touch, self.start_time, commit_time) {
                Ok(()) => rollback_log.push((Arc::clone(&touch.file), self.start_time, commit_time)),
                Err(err) => {
                    tracing::error!(txn_id = %self.id, ?file_id, %err, "commit materialization failed");
                    failure = Some(err);
                    break;
                }
            }
        }

        let outcome = match failure {
            None => {
                self.finalize(TransactionStatus::Committed);
                tracing::info!(txn_id = %self.id, commit_time = %commit_time, "transaction committed");
                Ok(())
            }
            Some(err) => match self.run_rollback(&rollback_log) {
                Ok(()) => {
                    self.finalize(TransactionStatus::RolledBack);
                    tracing::warn!(txn_id = %self.id, "commit failed, rollback succeeded");
                    Err(Error::CommitFailed {
                        txn_id: self.id,
                        reason: err.to_string(),
                    })
                }
                Err(rollback_err) => {
                    self.finalize(TransactionStatus::RollbackFailed);
                    tracing::error!(txn_id = %self.id, %rollback_err, "rollback itself failed");
                    Err(Error::Critical {
                        txn_id: self.id,
                        reason: rollback_err.to_string(),
                    })
                }
            },
        };

        for &file_id in &acquired {
            self.locks.release(file_id, self.id);
        }

        outcome
    }

    /// Run the compensating rollback protocol over a commit's rollback log:
    /// one rollback timestamp, shared across every entry, so the whole
    /// compensating pass reads as a single logical instant.
    fn run_rollback(&self, log: &[(SharedFile, Timestamp, Timestamp)]) -> Result<()> {
        let rollback_time = self.clock.next();
        for (file, txn_start, txn_commit) in log {
            file.lock()
                .rollback_commit(*txn_start, *txn_commit, rollback_time)?;
        }
        Ok(())
    }

    /// Discard the modification buffer and finalize as `Aborted`. No locks
    /// are released because a non-committing transaction never holds one.
    pub fn abort(&mut self) -> Result<()> {
        self.check_active()?;
        self.finalize(TransactionStatus::Aborted);
        tracing::info!(txn_id = %self.id, "transaction aborted");
        Ok(())
    }

    fn finalize(&mut self, status: TransactionStatus) {
        let end_time = self.clock.next();
        for touch in self.touched.values() {
            touch.file.lock().decrement_active();
        }
        self.registry.update(self.id, status, Some(end_time));
        self.status = status;
    }
}

/// Re-derive a file's content under this transaction's baseline plus its
/// buffered batches (the same rule `read` uses), then commit it — all
/// while the caller already holds the file's exclusive lock, so this never
/// re-acquires one of its own.
fn materialize_and_commit(
    touch: &FileTouch,
    baseline_time: Timestamp,
    commit_time: Timestamp,
) -> Result<()> {
    let mut guard = touch.file.lock();
    let mut content = guard.read_at(baseline_time)?;
    for batch in &touch.batches {
        content = apply(&content, batch)?;
    }
    guard.commit_version_at(&content, commit_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filestore_diff::diff;
    use filestore_storage::FileObject;

    fn engine_parts() -> (Arc<LockManager>, Arc<TransactionRegistry>, Arc<MonotonicClock>) {
        (
            Arc::new(LockManager::new()),
            Arc::new(TransactionRegistry::new()),
            Arc::new(MonotonicClock::new()),
        )
    }

    fn shared(content: &str, created_at: Timestamp) -> SharedFile {
        Arc::new(parking_lot::Mutex::new(FileObject::new(
            FileId::new(),
            content,
            created_at,
        )))
    }

    #[test]
    fn read_then_write_then_read_sees_buffered_content() {
        let (locks, registry, clock) = engine_parts();
        let t0 = clock.next();
        let file = shared("", t0);
        let mut txn = Transaction::new(
            TxnId::new(),
            clock.next(),
            IsolationLevel::Snapshot,
            locks,
            registry,
            clock,
        );

        assert_eq!(txn.read(&file).unwrap(), "");
        txn.write(&file, diff("", "hello")).unwrap();
        assert_eq!(txn.read(&file).unwrap(), "hello");
    }

    #[test]
    fn write_rejected_at_read_only_isolation() {
        let (locks, registry, clock) = engine_parts();
        let file = shared("", clock.next());
        let mut txn = Transaction::new(
            TxnId::new(),
            clock.next(),
            IsolationLevel::ReadCommitted,
            locks,
            registry,
            clock,
        );
        let err = txn.write(&file, diff("", "x")).unwrap_err();
        assert!(matches!(err, Error::WriteNotPermittedAtIsolation { .. }));
    }

    #[test]
    fn commit_with_no_writes_is_trivially_committed() {
        let (locks, registry, clock) = engine_parts();
        let file = shared("hello", clock.next());
        let mut txn = Transaction::new(
            TxnId::new(),
            clock.next(),
            IsolationLevel::Snapshot,
            locks,
            registry,
            clock,
        );
        txn.read(&file).unwrap();
        txn.commit().unwrap();
        assert_eq!(txn.status(), TransactionStatus::Committed);
    }

    #[test]
    fn commit_materializes_buffered_write_onto_the_file() {
        let (locks, registry, clock) = engine_parts();
        let file = shared("", clock.next());
        let mut txn = Transaction::new(
            TxnId::new(),
            clock.next(),
            IsolationLevel::Snapshot,
            locks,
            registry,
            clock,
        );
        txn.write(&file, diff("", "hello")).unwrap();
        txn.commit().unwrap();
        assert_eq!(txn.status(), TransactionStatus::Committed);
        assert_eq!(file.lock().read_latest().unwrap(), "hello");
    }

    #[test]
    fn operations_after_termination_signal_inactive() {
        let (locks, registry, clock) = engine_parts();
        let file = shared("", clock.next());
        let mut txn = Transaction::new(
            TxnId::new(),
            clock.next(),
            IsolationLevel::Snapshot,
            locks,
            registry,
            clock,
        );
        txn.abort().unwrap();
        assert!(matches!(
            txn.read(&file).unwrap_err(),
            Error::InactiveTransaction { .. }
        ));
        assert!(matches!(
            txn.commit().unwrap_err(),
            Error::InactiveTransaction { .. }
        ));
    }

    #[test]
    fn commit_conflict_leaves_transaction_active_for_retry() {
        let (locks, registry, clock) = engine_parts();
        let file = shared("", clock.next());
        let file_id = file.lock().id();
        let mut txn = Transaction::new(
            TxnId::new(),
            clock.next(),
            IsolationLevel::Snapshot,
            Arc::clone(&locks),
            registry,
            clock,
        );
        txn.write(&file, diff("", "x")).unwrap();

        // Simulate a concurrent exclusive holder on the same file.
        let outsider = TxnId::new();
        assert!(locks.acquire(file_id, outsider, LockMode::Exclusive));

        let err = txn.commit().unwrap_err();
        assert!(matches!(err, Error::LockConflict { .. }));
        assert_eq!(txn.status(), TransactionStatus::Active);

        locks.release(file_id, outsider);
        txn.commit().unwrap();
        assert_eq!(txn.status(), TransactionStatus::Committed);
    }

    #[test]
    fn touched_files_active_count_is_decremented_on_termination() {
        let (locks, registry, clock) = engine_parts();
        let file = shared("x", clock.next());
        let mut txn = Transaction::new(
            TxnId::new(),
            clock.next(),
            IsolationLevel::Snapshot,
            locks,
            registry,
            clock,
        );
        txn.read(&file).unwrap();
        assert_eq!(file.lock().active_transaction_count(), 1);
        txn.abort().unwrap();
        assert_eq!(file.lock().active_transaction_count(), 0);
    }
}
