//! # Hierarchical Storage
//!
//! The repository engine only sees a tree of named containers and leaves,
//! addressed by relative slash paths (`org/example/demo/1.0/demo-1.0.jar`).
//! That path is the identity under which artifacts are indexed.
//!
//! Two implementations are provided:
//!
//! - [`FsStore`]: a directory on the local filesystem
//! - [`MemoryStore`]: an in-process tree, used by tests

use chrono::{DateTime, Utc};
use std::fmt;
use std::io::{self, Read, Seek};

mod fs;
mod memory;

pub use self::fs::FsStore;
pub use self::memory::MemoryStore;

/// Readable, seekable content handle returned by a store.
pub trait Blob: Read + Seek + Send {}

impl<T: Read + Seek + Send> Blob for T {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Container,
    Leaf,
}

/// A child of a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Relative slash path from the store root.
    pub key: String,
    pub name: String,
    pub kind: EntryKind,
}

impl Entry {
    pub fn new(container: &str, name: &str, kind: EntryKind) -> Self {
        Entry {
            key: join_key(container, name),
            name: name.to_string(),
            kind,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.kind == EntryKind::Leaf
    }
}

/// Storage backend the repository is built on.
///
/// The empty key `""` denotes the root container. Children are returned in a
/// stable order (sorted by name) so that scans encounter files consistently.
pub trait Store: Send + Sync + fmt::Debug {
    fn children(&self, container: &str) -> io::Result<Vec<Entry>>;

    fn child(&self, container: &str, name: &str) -> io::Result<Option<Entry>>;

    fn open(&self, key: &str) -> io::Result<Box<dyn Blob>>;

    /// Write a leaf, creating missing parent containers. Returns the byte count.
    fn write(&self, key: &str, content: &mut dyn Read) -> io::Result<u64>;

    /// Delete a leaf. Removing a missing leaf is not an error.
    fn remove(&self, key: &str) -> io::Result<()>;

    /// Modification time, for stores that track one.
    fn last_modified(&self, _key: &str) -> Option<DateTime<Utc>> {
        None
    }

    fn is_writable(&self) -> bool;
}

pub fn join_key(container: &str, name: &str) -> String {
    if container.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", container, name)
    }
}

/// Split a key into its parent container and last segment.
pub fn split_key(key: &str) -> (&str, &str) {
    key.rsplit_once('/').unwrap_or(("", key))
}

/// Reject keys that could escape the store root.
pub(crate) fn check_key(key: &str) -> io::Result<()> {
    if key.is_empty() {
        return Ok(());
    }
    let bad = key.starts_with('/')
        || key.contains('\\')
        || key.contains('\0')
        || key
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if bad {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid storage key: {}", key),
        ));
    }
    Ok(())
}

pub(crate) fn read_only_error(key: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("store is read-only, refusing to modify {}", key),
    )
}
