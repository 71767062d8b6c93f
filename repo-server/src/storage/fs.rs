use super::{check_key, read_only_error, split_key, Blob, Entry, EntryKind, Store};
use chrono::{DateTime, Utc};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
    read_only: bool,
}

impl FsStore {
    /// Open a store at `root`, creating the directory for writable stores.
    pub fn open(root: impl Into<PathBuf>, read_only: bool) -> io::Result<Self> {
        let root = root.into();
        if !read_only {
            fs::create_dir_all(&root)?;
        }
        info!(root = %root.display(), read_only, "Opened filesystem store");
        Ok(FsStore { root, read_only })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> io::Result<PathBuf> {
        check_key(key)?;
        if key.is_empty() {
            return Ok(self.root.clone());
        }
        Ok(key.split('/').fold(self.root.clone(), |path, segment| path.join(segment)))
    }

    fn kind_of(path: &Path) -> io::Result<Option<EntryKind>> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(if metadata.is_dir() {
            Some(EntryKind::Container)
        } else if metadata.is_file() {
            Some(EntryKind::Leaf)
        } else {
            None
        })
    }
}

fn write_temp(tmp_path: &Path, content: &mut dyn Read) -> io::Result<u64> {
    let mut tmp = File::create(tmp_path)?;
    let written = io::copy(content, &mut tmp)?;
    tmp.flush()?;
    tmp.sync_all()?;
    Ok(written)
}

impl Store for FsStore {
    fn children(&self, container: &str) -> io::Result<Vec<Entry>> {
        let dir = self.resolve(container)?;
        let read_dir = match fs::read_dir(&dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut entries = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = dir_entry?;
            let Some(name) = dir_entry.file_name().to_str().map(str::to_owned) else {
                warn!(path = %dir_entry.path().display(), "Skipping entry with non UTF-8 name");
                continue;
            };
            if let Some(kind) = Self::kind_of(&dir_entry.path())? {
                entries.push(Entry::new(container, &name, kind));
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn child(&self, container: &str, name: &str) -> io::Result<Option<Entry>> {
        let entry = Entry::new(container, name, EntryKind::Leaf);
        let path = self.resolve(&entry.key)?;
        Ok(Self::kind_of(&path)?.map(|kind| Entry { kind, ..entry }))
    }

    fn open(&self, key: &str) -> io::Result<Box<dyn Blob>> {
        let file = File::open(self.resolve(key)?)?;
        Ok(Box::new(file))
    }

    fn write(&self, key: &str, content: &mut dyn Read) -> io::Result<u64> {
        if self.read_only {
            return Err(read_only_error(key));
        }
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
            debug!(parent = %parent.display(), "Created parent directory");
        }

        // Write next to the target and rename so readers never see a partial file
        let (_, name) = split_key(key);
        let tmp_path = path.with_file_name(format!(".{}.part", name));
        let written = write_temp(&tmp_path, content)
            .and_then(|written| fs::rename(&tmp_path, &path).map(|()| written))
            .inspect_err(|e| {
                warn!(path = %tmp_path.display(), error = %e, "Discarding partial upload");
                let _ = fs::remove_file(&tmp_path);
            })?;

        info!(path = %path.display(), size = written, "File saved successfully");
        Ok(written)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        if self.read_only {
            return Err(read_only_error(key));
        }
        let path = self.resolve(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(path = %path.display(), "File removed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn last_modified(&self, key: &str) -> Option<DateTime<Utc>> {
        let path = self.resolve(key).ok()?;
        let modified = fs::metadata(path).ok()?.modified().ok()?;
        Some(DateTime::<Utc>::from(modified))
    }

    fn is_writable(&self) -> bool {
        !self.read_only
    }
}
