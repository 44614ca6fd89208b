//! Line/character diff codec
//!
//! Computes and applies the tagged-variant diff operations that every file
//! version is stored as. The similarity matching itself is delegated to
//! [`similar`]; everything else here — the operation shape, the validation
//! rule, and the descending-start apply order — is this engine's own
//! contract.
//!
//! Indices address `char` positions, not bytes: callers think of file
//! content as a sequence of Unicode scalar values, and byte-indexing a Rust
//! `&str` would both disagree with that semantics and risk panicking on
//! non-boundary splits.

#![warn(missing_docs)]
#![warn(clippy::all)]

use filestore_core::{Error, Result};

/// A single edit against a base string.
///
/// All three constructors are closed — there is no fourth case — so match
/// arms over `DiffOp` are always exhaustive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOp {
    /// Replace the half-open range `[start, end)` with `data`.
    Replace {
        /// Start of the replaced range, inclusive.
        start: usize,
        /// End of the replaced range, exclusive.
        end: usize,
        /// Replacement text.
        data: String,
    },
    /// Remove the half-open range `[start, end)`.
    Delete {
        /// Start of the removed range, inclusive.
        start: usize,
        /// End of the removed range, exclusive.
        end: usize,
    },
    /// Insert `data` before position `start`.
    Insert {
        /// Position the insertion happens before.
        start: usize,
        /// Text to insert.
        data: String,
    },
}

impl DiffOp {
    /// The operation's start index.
    pub fn start(&self) -> usize {
        match self {
            DiffOp::Replace { start, .. } => *start,
            DiffOp::Delete { start, .. } => *start,
            DiffOp::Insert { start, .. } => *start,
        }
    }

    /// The operation's end index, if it has one. `Insert` has none — it
    /// addresses a single position, not a range.
    pub fn end(&self) -> Option<usize> {
        match self {
            DiffOp::Replace { end, .. } => Some(*end),
            DiffOp::Delete { end, .. } => Some(*end),
            DiffOp::Insert { .. } => None,
        }
    }
}

/// An ordered sequence of edits, each independently indexed against the
/// base string as it existed before any operation in the batch was applied.
pub type DiffBatch = Vec<DiffOp>;

/// Compute a batch of edits that transforms `old` into `new`.
///
/// Returns an empty batch if `old == new`.
pub fn diff(old: &str, new: &str) -> DiffBatch {
    if old == new {
        return Vec::new();
    }

    let new_chars: Vec<char> = new.chars().collect();
    let text_diff = similar::TextDiff::from_chars(old, new);

    let mut batch = Vec::new();
    for op in text_diff.ops() {
        match op.tag() {
            similar::DiffTag::Equal => {}
            similar::DiffTag::Delete => {
                let range = op.old_range();
                batch.push(DiffOp::Delete {
                    start: range.start,
                    end: range.end,
                });
            }
            similar::DiffTag::Insert => {
                let start = op.old_range().start;
                let data: String = new_chars[op.new_range()].iter().collect();
                batch.push(DiffOp::Insert { start, data });
            }
            similar::DiffTag::Replace => {
                let old_range = op.old_range();
                let data: String = new_chars[op.new_range()].iter().collect();
                batch.push(DiffOp::Replace {
                    start: old_range.start,
                    end: old_range.end,
                    data,
                });
            }
        }
    }
    batch
}

/// Apply a batch of edits to `content`, returning the transformed string.
///
/// Operations are validated against `content`'s length before any edit is
/// made, then applied in **descending `start` order** so that an earlier
/// edit never invalidates the indices of a later one in the same batch.
pub fn apply(content: &str, batch: &[DiffOp]) -> Result<String> {
    let chars: Vec<char> = content.chars().collect();
    let len = chars.len();

    for op in batch {
        validate(op, len)?;
    }

    let mut ordered: Vec<&DiffOp> = batch.iter().collect();
    ordered.sort_by(|a, b| b.start().cmp(&a.start()));

    let mut result = chars;
    for op in ordered {
        match op {
            DiffOp::Replace { start, end, data } => {
                result.splice(*start..*end, data.chars());
            }
            DiffOp::Delete { start, end } => {
                result.splice(*start..*end, std::iter::empty());
            }
            DiffOp::Insert { start, data } => {
                result.splice(*start..*start, data.chars());
            }
        }
    }
    Ok(result.into_iter().collect())
}

fn validate(op: &DiffOp, len: usize) -> Result<()> {
    let start = op.start();
    let end = op.end().unwrap_or(start);
    if start > len || end < start || end > len {
        return Err(Error::InvalidIndex {
            start: start as i64,
            end: op.end().map(|e| e as i64),
            len,
        });
    }
    Ok(())
}
