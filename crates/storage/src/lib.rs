//! Versioned file storage
//!
//! Owns the representation of a single file's history — a snapshot plus an
//! append-only diff log — independent of locking or transaction concerns,
//! which live in `filestore-concurrency` and `filestore-engine`
//! respectively.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod file_object;

pub use file_object::{FileObject, FileVersion};
