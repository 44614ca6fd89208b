//! Opaque identifiers for files and transactions
//!
//! Both ids are thin wrappers around a UUID v4. They are deliberately not
//! interchangeable with each other or with a raw `Uuid` — the type system
//! catches the "passed a file id where a transaction id was expected" class
//! of bug that a bare `Uuid` (or `String`) everywhere would not.

use std::fmt;
use uuid::Uuid;

/// Unique, opaque identifier for a [`FileObject`](crate) for its lifetime.
///
/// `FileId` orders consistently (it derives `Ord` via the wrapped UUID's byte
/// order), which is what the commit protocol relies on for its
/// ascending-file-id lock acquisition order (see `filestore-engine`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(Uuid);

impl FileId {
    /// Create a new random file id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique, opaque identifier for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxnId(Uuid);

impl TxnId {
    /// Create a new random transaction id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TxnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(FileId::new(), FileId::new());
        assert_ne!(TxnId::new(), TxnId::new());
    }

    #[test]
    fn file_ids_are_orderable() {
        let mut ids = vec![FileId::new(), FileId::new(), FileId::new()];
        ids.sort();
        assert!(ids.windows(2).all(|w| w[0] <= w[1]));
    }
}
