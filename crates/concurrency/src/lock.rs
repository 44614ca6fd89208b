//! Per-file shared/exclusive lock manager
//!
//! Locking is **non-blocking**: `acquire` never waits, it returns `false` on
//! conflict and leaves it to the caller (the commit protocol, in practice)
//! to decide whether to retry or abort. Converting contention into an
//! explicit failure rather than a wait is what lets the commit protocol's
//! ascending-file-id acquisition order (`filestore-engine`) serve as the
//! sole deadlock guard: a violation degrades to a spurious abort, never a
//! hang.

use filestore_core::{FileId, TxnId};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// The mode a lock entry is held in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    /// Any number of transactions may hold a shared lock on the same file
    /// at once.
    Shared,
    /// At most one transaction may hold an exclusive lock on a file, and
    /// no other lock (shared or exclusive) may coexist with it.
    Exclusive,
}

#[derive(Debug)]
struct LockEntry {
    mode: LockMode,
    holders: HashSet<TxnId>,
}

/// Per-file shared/exclusive lock table.
///
/// All state lives behind one internal mutex rather than sharding per file
/// — the lock table itself is small and held only for the instant it takes
/// to check or update one entry, so contention on the mutex is not the
/// bottleneck the per-file locks themselves guard against.
#[derive(Debug, Default)]
pub struct LockManager {
    entries: Mutex<HashMap<FileId, LockEntry>>,
}

impl LockManager {
    /// Create an empty lock manager.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Attempt to acquire `requested` on `file_id` for `txn_id`.
    ///
    /// Non-blocking: returns immediately with `true` on success or `false`
    /// on conflict. Policy:
    /// 1. No entry yet: create one in `requested` mode, `txn_id` as sole
    ///    holder.
    /// 2. `txn_id` already holds this file: re-entrant success unless it
    ///    would be a Shared → Exclusive upgrade, which is always rejected.
    /// 3. A fresh Shared request against an existing Shared entry: join the
    ///    holder set.
    /// 4. Anything else (Exclusive held by someone else, or a Shared
    ///    request against an Exclusive entry): conflict.
    pub fn acquire(&self, file_id: FileId, txn_id: TxnId, requested: LockMode) -> bool {
        let mut entries = self.entries.lock();
        match entries.get_mut(&file_id) {
            None => {
                let mut holders = HashSet::with_capacity(1);
                holders.insert(txn_id);
                entries.insert(
                    file_id,
                    LockEntry {
                        mode: requested,
                        holders,
                    },
                );
                tracing::debug!(?file_id, ?txn_id, ?requested, "lock acquired (new entry)");
                true
            }
            Some(entry) if entry.holders.contains(&txn_id) => {
                if entry.mode == LockMode::Shared && requested == LockMode::Exclusive {
                    tracing::debug!(?file_id, ?txn_id, "lock upgrade rejected");
                    false
                } else {
                    true
                }
            }
            Some(entry) if entry.mode == LockMode::Shared && requested == LockMode::Shared => {
                entry.holders.insert(txn_id);
                tracing::debug!(?file_id, ?txn_id, "shared lock joined");
                true
            }
            Some(_) => {
                tracing::debug!(?file_id, ?txn_id, ?requested, "lock conflict");
                false
            }
        }
    }

    /// Release `txn_id`'s hold on `file_id`, if any.
    ///
    /// Idempotent: a no-op if `txn_id` is not currently a holder of
    /// `file_id`, or if `file_id` has no entry at all. The entry itself is
    /// removed once its holder set becomes empty.
    pub fn release(&self, file_id: FileId, txn_id: TxnId) {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get_mut(&file_id) {
            entry.holders.remove(&txn_id);
            if entry.holders.is_empty() {
                entries.remove(&file_id);
            }
        }
    }

    /// Whether `file_id` currently has no lock entry at all. Exposed
    /// mainly for tests and diagnostics.
    pub fn is_free(&self, file_id: FileId) -> bool {
        !self.entries.lock().contains_key(&file_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_acquire_on_a_file_always_succeeds() {
        let mgr = LockManager::new();
        let file = FileId::new();
        let txn = TxnId::new();
        assert!(mgr.acquire(file, txn, LockMode::Shared));
    }

    #[test]
    fn shared_admits_multiple_distinct_holders() {
        let mgr = LockManager::new();
        let file = FileId::new();
        let (t1, t2, t3) = (TxnId::new(), TxnId::new(), TxnId::new());
        assert!(mgr.acquire(file, t1, LockMode::Shared));
        assert!(mgr.acquire(file, t2, LockMode::Shared));
        assert!(mgr.acquire(file, t3, LockMode::Shared));
    }

    #[test]
    fn exclusive_admits_exactly_one_holder() {
        let mgr = LockManager::new();
        let file = FileId::new();
        let (t1, t2) = (TxnId::new(), TxnId::new());
        assert!(mgr.acquire(file, t1, LockMode::Exclusive));
        assert!(!mgr.acquire(file, t2, LockMode::Exclusive));
        assert!(!mgr.acquire(file, t2, LockMode::Shared));
    }

    #[test]
    fn exclusive_conflicts_with_existing_shared() {
        let mgr = LockManager::new();
        let file = FileId::new();
        let (t1, t2) = (TxnId::new(), TxnId::new());
        assert!(mgr.acquire(file, t1, LockMode::Shared));
        assert!(!mgr.acquire(file, t2, LockMode::Exclusive));
    }

    #[test]
    fn no_upgrade_from_shared_to_exclusive() {
        let mgr = LockManager::new();
        let file = FileId::new();
        let txn = TxnId::new();
        assert!(mgr.acquire(file, txn, LockMode::Shared));
        assert!(!mgr.acquire(file, txn, LockMode::Exclusive));
    }

    #[test]
    fn reentrant_acquire_at_same_or_weaker_mode_succeeds() {
        let mgr = LockManager::new();
        let file = FileId::new();
        let txn = TxnId::new();
        assert!(mgr.acquire(file, txn, LockMode::Exclusive));
        assert!(mgr.acquire(file, txn, LockMode::Exclusive));
        assert!(mgr.acquire(file, txn, LockMode::Shared));
    }

    #[test]
    fn release_is_idempotent_for_non_holders() {
        let mgr = LockManager::new();
        let file = FileId::new();
        let txn = TxnId::new();
        mgr.release(file, txn);
        mgr.release(file, txn);
        assert!(mgr.is_free(file));
    }

    #[test]
    fn release_frees_the_file_once_holders_are_empty() {
        let mgr = LockManager::new();
        let file = FileId::new();
        let (t1, t2) = (TxnId::new(), TxnId::new());
        mgr.acquire(file, t1, LockMode::Shared);
        mgr.acquire(file, t2, LockMode::Shared);
        mgr.release(file, t1);
        assert!(!mgr.is_free(file));
        mgr.release(file, t2);
        assert!(mgr.is_free(file));
    }

    #[test]
    fn release_then_reacquire_exclusive_succeeds() {
        let mgr = LockManager::new();
        let file = FileId::new();
        let (t1, t2) = (TxnId::new(), TxnId::new());
        mgr.acquire(file, t1, LockMode::Exclusive);
        mgr.release(file, t1);
        assert!(mgr.acquire(file, t2, LockMode::Exclusive));
    }
}
