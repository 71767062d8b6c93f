use crate::coordinate::{strip_extension, Coordinate, DESCRIPTOR_EXTENSION};
use crate::descriptor::read_embedded_pom;
use crate::storage::{split_key, Blob, Store};
use chrono::{DateTime, Utc};
use std::io::{self, Cursor};
use std::sync::Arc;
use tracing::debug;

/// An indexed artifact: a coordinate bound to the store leaf it was read from.
///
/// Content and descriptor are re-opened from the store on every call. Artifacts
/// are never mutated; replacing one means indexing a new value.
#[derive(Debug, Clone)]
pub struct Artifact {
    coordinate: Coordinate,
    key: String,
    store: Arc<dyn Store>,
    created: DateTime<Utc>,
}

impl Artifact {
    pub fn new(coordinate: Coordinate, key: impl Into<String>, store: Arc<dyn Store>) -> Self {
        Artifact {
            coordinate,
            key: key.into(),
            store,
            created: Utc::now(),
        }
    }

    pub fn coordinate(&self) -> &Coordinate {
        &self.coordinate
    }

    /// Store identity this artifact was built from.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn group(&self) -> &str {
        &self.coordinate.group
    }

    pub fn artifact_id(&self) -> &str {
        &self.coordinate.artifact
    }

    pub fn version(&self) -> &str {
        &self.coordinate.version
    }

    pub fn packaging(&self) -> &str {
        &self.coordinate.packaging
    }

    pub fn is_test(&self) -> bool {
        self.coordinate.is_test
    }

    /// Store timestamp when available, otherwise when this value was created.
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.store.last_modified(&self.key).unwrap_or(self.created)
    }

    pub fn content(&self) -> io::Result<Box<dyn Blob>> {
        self.store.open(&self.key)
    }

    /// The descriptor: the content itself for `pom` packaging, else the sibling
    /// `.pom`, else the `pom.xml` embedded in the archive.
    pub fn descriptor(&self) -> io::Result<Option<Box<dyn Blob>>> {
        if self.coordinate.is_descriptor_only() {
            return self.content().map(Some);
        }

        let (container, name) = split_key(&self.key);
        let sibling = format!("{}.{}", strip_extension(name), DESCRIPTOR_EXTENSION);
        if let Some(entry) = self.store.child(container, &sibling)? {
            if entry.is_leaf() {
                return self.store.open(&entry.key).map(Some);
            }
        }

        match read_embedded_pom(self.content()?) {
            Ok(Some(bytes)) => Ok(Some(Box::new(Cursor::new(bytes)))),
            Ok(None) => Ok(None),
            Err(e) => {
                debug!(key = %self.key, error = %e, "No embedded descriptor readable");
                Ok(None)
            }
        }
    }
}
