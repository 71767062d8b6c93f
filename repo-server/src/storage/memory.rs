use super::{check_key, join_key, read_only_error, Blob, Entry, EntryKind, Store};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::io::{self, Cursor, Read};
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone)]
struct StoredLeaf {
    data: Arc<[u8]>,
    modified: DateTime<Utc>,
}

/// In-memory store. Containers exist implicitly as prefixes of stored leaves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    leaves: RwLock<BTreeMap<String, StoredLeaf>>,
    read_only: bool,
    timestamps: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            timestamps: true,
            ..Default::default()
        }
    }

    /// A store that does not report modification times.
    pub fn without_timestamps() -> Self {
        MemoryStore::default()
    }

    /// Freeze the store; further writes fail.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Seed a leaf, bypassing the read-only flag.
    pub fn insert(&self, key: &str, data: impl Into<Vec<u8>>) {
        let leaf = StoredLeaf {
            data: Arc::from(data.into()),
            modified: Utc::now(),
        };
        self.leaves
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), leaf);
    }

    pub fn len(&self) -> usize {
        self.leaves
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Store for MemoryStore {
    fn children(&self, container: &str) -> io::Result<Vec<Entry>> {
        check_key(container)?;
        let prefix = if container.is_empty() {
            String::new()
        } else {
            format!("{}/", container)
        };

        let leaves = self.leaves.read().unwrap_or_else(PoisonError::into_inner);
        let mut children: BTreeMap<&str, EntryKind> = BTreeMap::new();
        for key in leaves.keys() {
            let Some(rest) = key.strip_prefix(prefix.as_str()) else {
                continue;
            };
            match rest.split_once('/') {
                Some((name, _)) => {
                    children.insert(name, EntryKind::Container);
                }
                None => {
                    children.entry(rest).or_insert(EntryKind::Leaf);
                }
            }
        }

        Ok(children
            .into_iter()
            .map(|(name, kind)| Entry::new(container, name, kind))
            .collect())
    }

    fn child(&self, container: &str, name: &str) -> io::Result<Option<Entry>> {
        let key = join_key(container, name);
        check_key(&key)?;
        let leaves = self.leaves.read().unwrap_or_else(PoisonError::into_inner);
        if leaves.contains_key(&key) {
            return Ok(Some(Entry::new(container, name, EntryKind::Leaf)));
        }
        let prefix = format!("{}/", key);
        let is_container = leaves
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(k, _)| k.starts_with(&prefix));
        Ok(is_container.then(|| Entry::new(container, name, EntryKind::Container)))
    }

    fn open(&self, key: &str) -> io::Result<Box<dyn Blob>> {
        let leaves = self.leaves.read().unwrap_or_else(PoisonError::into_inner);
        let leaf = leaves.get(key).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no such leaf: {}", key))
        })?;
        Ok(Box::new(Cursor::new(Arc::clone(&leaf.data))))
    }

    fn write(&self, key: &str, content: &mut dyn Read) -> io::Result<u64> {
        if self.read_only {
            return Err(read_only_error(key));
        }
        check_key(key)?;
        let mut data = Vec::new();
        let written = content.read_to_end(&mut data)? as u64;
        self.insert(key, data);
        Ok(written)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        if self.read_only {
            return Err(read_only_error(key));
        }
        check_key(key)?;
        self.leaves
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }

    fn last_modified(&self, key: &str) -> Option<DateTime<Utc>> {
        if !self.timestamps {
            return None;
        }
        let leaves = self.leaves.read().unwrap_or_else(PoisonError::into_inner);
        leaves.get(key).map(|leaf| leaf.modified)
    }

    fn is_writable(&self) -> bool {
        !self.read_only
    }
}
