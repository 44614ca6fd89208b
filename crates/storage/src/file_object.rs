//! Versioned, in-memory file content
//!
//! A [`FileObject`] stores its content once as a snapshot and thereafter as
//! an append-only log of diffs against that snapshot. Reading "as of" any
//! timestamp replays the prefix of the log up to and including that
//! timestamp onto the snapshot; nothing is ever overwritten or removed from
//! the log, which is what lets two transactions at different isolation
//! levels observe two different, simultaneously valid, views of the same
//! file.

use filestore_core::{FileId, Result, Timestamp};
use filestore_diff::{apply, diff, DiffBatch};

/// One committed change to a file: the diff that produced it and the
/// timestamp it was committed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileVersion {
    /// The time this version was committed.
    pub committed_at: Timestamp,
    /// The edit that transforms the file's content as of the prior version
    /// into this version's content.
    pub diff: DiffBatch,
}

/// A single versioned file: a snapshot plus the append-only log of diffs
/// committed after it.
#[derive(Debug, Clone)]
pub struct FileObject {
    id: FileId,
    snapshot: String,
    snapshot_time: Timestamp,
    versions: Vec<FileVersion>,
    /// Number of transactions currently holding a reference to some view of
    /// this file's history, tracked by the transaction lifecycle via its
    /// touched-file set. Gates `compact`.
    active_transaction_count: usize,
}

impl FileObject {
    /// Create a new file with the given initial content, effective as of
    /// `created_at`.
    pub fn new(id: FileId, content: impl Into<String>, created_at: Timestamp) -> Self {
        Self {
            id,
            snapshot: content.into(),
            snapshot_time: created_at,
            versions: Vec::new(),
            active_transaction_count: 0,
        }
    }

    /// This file's identity.
    pub fn id(&self) -> FileId {
        self.id
    }

    /// The timestamp of this file's most recent committed version, or its
    /// snapshot time if it has never been written to since creation.
    pub fn latest_time(&self) -> Timestamp {
        self.versions
            .last()
            .map(|v| v.committed_at)
            .unwrap_or(self.snapshot_time)
    }

    /// Reconstruct this file's content as it existed at `at`.
    ///
    /// Versions are kept in committed-time order, so the prefix to replay
    /// is found with a binary search rather than a linear scan.
    pub fn read_at(&self, at: Timestamp) -> Result<String> {
        let cut = self.versions.partition_point(|v| v.committed_at <= at);
        let mut content = self.snapshot.clone();
        for version in &self.versions[..cut] {
            content = apply(&content, &version.diff)?;
        }
        Ok(content)
    }

    /// The file's current content, as of its most recent version.
    pub fn read_latest(&self) -> Result<String> {
        self.read_at(self.latest_time())
    }

    /// Append a new committed version holding `new_content`.
    ///
    /// Computes `baseline = read_at(at)` and records the diff from that
    /// baseline to `new_content` as the new version. Because `at` must be
    /// strictly greater than every existing version's timestamp (the
    /// engine's precondition — callers drawing timestamps from a single
    /// [`MonotonicClock`](filestore_core::MonotonicClock) get this for
    /// free), `read_at(at)` and [`read_latest`](Self::read_latest) agree in
    /// practice; `read_at` is used here because it is the contract this
    /// method was designed against.
    pub fn commit_version_at(&mut self, new_content: &str, at: Timestamp) -> Result<()> {
        let baseline = self.read_at(at)?;
        let diff_batch = diff(&baseline, new_content);
        self.versions.push(FileVersion {
            committed_at: at,
            diff: diff_batch,
        });
        Ok(())
    }

    /// Append a compensating version that logically undoes the commit made
    /// at `txn_commit` by a transaction that started at `txn_start`.
    ///
    /// A no-op if no version was ever committed at exactly `txn_commit` —
    /// the commit may have already been rolled back, or may never have
    /// landed on this file at all. Otherwise computes `before =
    /// read_at(txn_start)`, `after = read_at(txn_commit)`, and appends the
    /// diff from `after` back to `before` as a new version at
    /// `rollback_time`. This leaves the forward history untouched: a read
    /// at any `t` with `txn_commit <= t < rollback_time` still observes the
    /// (briefly valid) committed content, matching what was actually
    /// readable at that instant.
    pub fn rollback_commit(
        &mut self,
        txn_start: Timestamp,
        txn_commit: Timestamp,
        rollback_time: Timestamp,
    ) -> Result<()> {
        if !self.versions.iter().any(|v| v.committed_at == txn_commit) {
            tracing::debug!(file_id = %self.id, %txn_commit, "rollback_commit: no matching version, no-op");
            return Ok(());
        }
        let before = self.read_at(txn_start)?;
        let after = self.read_at(txn_commit)?;
        let compensating = diff(&after, &before);
        self.versions.push(FileVersion {
            committed_at: rollback_time,
            diff: compensating,
        });
        tracing::info!(file_id = %self.id, %txn_commit, %rollback_time, "compensating version appended");
        Ok(())
    }

    /// Fold every version up to and including `as_of` into a new snapshot,
    /// discarding the diffs that produced them.
    ///
    /// Succeeds only if no transaction currently depends on this file's
    /// history (`active_transaction_count() == 0`) and `as_of` is at or
    /// past every recorded version's timestamp — a cutoff strictly between
    /// two versions is rejected rather than silently folding only the
    /// earlier one, since that would discard history a read at a timestamp
    /// between the two still needs. Returns `false` without mutating
    /// anything if either gate fails; reads at or after `as_of` are
    /// unaffected by a successful compaction, while reads strictly before
    /// the new snapshot time are no longer possible.
    pub fn compact(&mut self, as_of: Timestamp) -> Result<bool> {
        if self.active_transaction_count != 0 {
            tracing::debug!(file_id = %self.id, active = self.active_transaction_count, "compact rejected: transaction still active");
            return Ok(false);
        }
        let cut = self.versions.partition_point(|v| v.committed_at <= as_of);
        if cut < self.versions.len() {
            tracing::debug!(file_id = %self.id, %as_of, "compact rejected: cutoff precedes a recorded version");
            return Ok(false);
        }
        let content = self.read_at(as_of)?;
        self.versions.drain(..cut);
        self.snapshot = content;
        self.snapshot_time = as_of;
        tracing::info!(file_id = %self.id, %as_of, folded = cut, "file compacted");
        Ok(true)
    }

    /// Record that one more transaction now depends on this file's history.
    pub fn increment_active(&mut self) {
        self.active_transaction_count += 1;
    }

    /// Record that one fewer transaction depends on this file's history.
    ///
    /// Saturates at zero rather than underflowing, since a transaction that
    /// never actually touched this file (e.g. it read another file and
    /// aborted) should not be able to drive the count negative.
    pub fn decrement_active(&mut self) {
        self.active_transaction_count = self.active_transaction_count.saturating_sub(1);
    }

    /// How many transactions currently depend on this file's history.
    pub fn active_transaction_count(&self) -> usize {
        self.active_transaction_count
    }
}
