//! # Repository Index
//!
//! The [`Repository`] owns an ordered index of every artifact discovered on its
//! [`Store`], keyed by store identity (the leaf's relative path) in the order
//! the leaves were first encountered.
//!
//! ## Scanning
//!
//! A scan walks the store depth-first and considers leaves ending in `.jar`,
//! `.war` or `.pom`. A `.pom` is only an artifact of its own when it declares
//! `<packaging>pom</packaging>` and has no `.jar`/`.war` sibling of the same
//! base name; otherwise it is the companion descriptor of a binary. Leaves
//! that fail to parse are logged and skipped. Scans only ever add entries;
//! [`Repository::rebuild`] starts over from an empty index.
//!
//! ## Concurrency
//!
//! `scan`, `rebuild` and `create` serialize on one write lock. Readers take a
//! shared lock on the index and always see a complete snapshot, since a scan
//! publishes its new entries in one step at the end.

use crate::artifact::Artifact;
use crate::coordinate::{
    extension, is_artifact_extension, is_test_file_name, strip_extension, Coordinate,
    BINARY_EXTENSIONS,
};
use crate::descriptor::{parse_pom, read_embedded_properties, DescriptorError, ProjectId};
use crate::error::{AppError, AppResult};
use crate::events::{EventSink, InternalGroups, NoopSink, RepositoryEvent};
use crate::storage::{Entry, EntryKind, Store};
use crate::validation::{validate_coordinate, validate_packaging};
use indexmap::{IndexMap, IndexSet};
use std::io::{self, Read};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct Repository {
    store: Arc<dyn Store>,
    index: RwLock<IndexMap<String, Artifact>>,
    write_lock: Mutex<()>,
    sink: Arc<dyn EventSink>,
    internal_groups: InternalGroups,
}

impl Repository {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Repository {
            store,
            index: RwLock::new(IndexMap::new()),
            write_lock: Mutex::new(()),
            sink: Arc::new(NoopSink),
            internal_groups: InternalGroups::default(),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_internal_groups(mut self, internal_groups: InternalGroups) -> Self {
        self.internal_groups = internal_groups;
        self
    }

    pub fn is_writable(&self) -> bool {
        self.store.is_writable()
    }

    pub fn is_internal(&self, group: &str) -> bool {
        self.internal_groups.is_internal(group)
    }

    /// Recursive scan.
    pub fn scan(&self) -> io::Result<usize> {
        self.scan_with(true)
    }

    /// Index leaves not seen before. Returns the number of new artifacts.
    pub fn scan_with(&self, recursive: bool) -> io::Result<usize> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let found = {
            let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
            let mut found = Vec::new();
            self.walk("", recursive, &index, &mut found)?;
            found
        };

        let added = found.len();
        if added > 0 {
            let mut index = self.index.write().unwrap_or_else(PoisonError::into_inner);
            index.extend(found);
            info!(added, total = index.len(), "Scan indexed new artifacts");
        } else {
            debug!("Scan found no new artifacts");
        }
        Ok(added)
    }

    /// Drop the index and scan the whole store again.
    pub fn rebuild(&self) -> io::Result<usize> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut found = Vec::new();
        self.walk("", true, &IndexMap::new(), &mut found)?;

        let rebuilt: IndexMap<String, Artifact> = found.into_iter().collect();
        let total = rebuilt.len();
        *self.index.write().unwrap_or_else(PoisonError::into_inner) = rebuilt;
        info!(total, "Rebuilt repository index");
        Ok(total)
    }

    fn walk(
        &self,
        container: &str,
        recursive: bool,
        known: &IndexMap<String, Artifact>,
        found: &mut Vec<(String, Artifact)>,
    ) -> io::Result<()> {
        for entry in self.store.children(container)? {
            match entry.kind {
                EntryKind::Leaf => {
                    let is_candidate = extension(&entry.name)
                        .is_some_and(|ext| is_artifact_extension(&ext));
                    if !is_candidate || known.contains_key(&entry.key) {
                        continue;
                    }
                    match self.parse_leaf(container, &entry) {
                        Ok(Some(artifact)) => {
                            debug!(key = %entry.key, coordinate = %artifact.coordinate(), "Indexed artifact");
                            found.push((entry.key.clone(), artifact));
                        }
                        Ok(None) => {
                            debug!(key = %entry.key, "Skipping companion descriptor");
                        }
                        Err(e) => {
                            warn!(key = %entry.key, error = %e, "Skipping unreadable artifact");
                        }
                    }
                }
                EntryKind::Container if recursive => {
                    self.walk(&entry.key, recursive, known, found)?;
                }
                EntryKind::Container => {}
            }
        }
        Ok(())
    }

    /// Build the artifact for a leaf, or `None` for a companion `.pom`.
    fn parse_leaf(
        &self,
        container: &str,
        entry: &Entry,
    ) -> Result<Option<Artifact>, DescriptorError> {
        let packaging = extension(&entry.name).unwrap_or_default();
        let base = strip_extension(&entry.name);

        let project = if packaging == "pom" {
            let descriptor = parse_pom(&self.read_leaf(&entry.key)?)?;
            if !descriptor.declares_pom_packaging() {
                return Ok(None);
            }
            for binary in BINARY_EXTENSIONS {
                if self
                    .store
                    .child(container, &format!("{}.{}", base, binary))?
                    .is_some()
                {
                    return Ok(None);
                }
            }
            descriptor.project_id()?
        } else {
            match read_embedded_properties(self.store.open(&entry.key)?) {
                Ok(project) => project,
                Err(DescriptorError::MissingProperties) => {
                    self.sibling_project(container, base)?
                        .ok_or(DescriptorError::MissingProperties)?
                }
                Err(e) => return Err(e),
            }
        };

        let coordinate = Coordinate::new(
            project.group_id,
            project.artifact_id,
            project.version,
            packaging,
            is_test_file_name(&entry.name),
        );
        Ok(Some(Artifact::new(
            coordinate,
            entry.key.clone(),
            Arc::clone(&self.store),
        )))
    }

    fn sibling_project(
        &self,
        container: &str,
        base: &str,
    ) -> Result<Option<ProjectId>, DescriptorError> {
        let Some(pom) = self.store.child(container, &format!("{}.pom", base))? else {
            return Ok(None);
        };
        let descriptor = parse_pom(&self.read_leaf(&pom.key)?)?;
        descriptor.project_id().map(Some)
    }

    fn read_leaf(&self, key: &str) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.store.open(key)?.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    /// Distinct groups in encounter order.
    pub fn list_groups(&self) -> Vec<String> {
        let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
        index
            .values()
            .map(|a| a.group().to_string())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct artifact ids of a group in encounter order.
    pub fn list_artifacts(&self, group: &str) -> Vec<String> {
        let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
        index
            .values()
            .filter(|a| a.group() == group)
            .map(|a| a.artifact_id().to_string())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct versions of an artifact in encounter order.
    pub fn list_versions(&self, group: &str, artifact: &str) -> Vec<String> {
        self.versions_of(group, artifact)
            .iter()
            .map(|a| a.version().to_string())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    /// Every indexed artifact of `group:artifact`, test variants included.
    pub fn versions_of(&self, group: &str, artifact: &str) -> Vec<Artifact> {
        let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
        index
            .values()
            .filter(|a| a.group() == group && a.artifact_id() == artifact)
            .cloned()
            .collect()
    }

    /// First artifact in encounter order matching the coordinate.
    pub fn get_artifact(
        &self,
        group: &str,
        artifact: &str,
        version: &str,
        is_test: bool,
    ) -> Option<Artifact> {
        let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
        index
            .values()
            .find(|a| a.coordinate().matches(group, artifact, version, is_test))
            .cloned()
    }

    /// Snapshot of the whole index.
    pub fn artifacts(&self) -> Vec<Artifact> {
        let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
        index.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store `content` at the coordinate's canonical location and index it.
    ///
    /// An artifact already present at the same coordinate is announced as
    /// deleted before the write. When it lived under another key (a different
    /// packaging) its leaf is removed from the store as well. Exactly one
    /// creation event follows a successful write.
    pub fn create(
        &self,
        group: &str,
        artifact: &str,
        version: &str,
        packaging: &str,
        content: &mut dyn Read,
        is_test: bool,
    ) -> AppResult<Artifact> {
        validate_coordinate(group, artifact, version)?;
        validate_packaging(packaging)?;
        if !self.store.is_writable() {
            return Err(AppError::Forbidden(
                "The repository does not support creation of new artifacts".to_string(),
            ));
        }

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let internal = self.is_internal(group);

        let current = self.get_artifact(group, artifact, version, is_test);
        if let Some(current) = &current {
            self.sink.notify(RepositoryEvent::Deleted {
                artifact: current.clone(),
                internal,
            });
        }

        let coordinate = Coordinate::new(group, artifact, version, packaging, is_test);
        let key = coordinate.relative_path();
        let size = self.store.write(&key, content)?;
        let created = Artifact::new(coordinate, key.clone(), Arc::clone(&self.store));

        let superseded = current.filter(|current| current.key() != key);
        if let Some(old) = &superseded {
            self.store.remove(old.key())?;
            debug!(key = %old.key(), "Removed superseded artifact");
        }

        {
            let mut index = self.index.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(old) = &superseded {
                index.shift_remove(old.key());
            }
            index.insert(key.clone(), created.clone());
        }

        info!(coordinate = %created.coordinate(), key = %key, size, internal, "Created artifact");
        self.sink.notify(RepositoryEvent::Created {
            artifact: created.clone(),
            internal,
        });
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    #[derive(Debug, Default)]
    struct RecordingSink {
        events: Mutex<Vec<(String, String)>>,
    }

    impl EventSink for RecordingSink {
        fn notify(&self, event: RepositoryEvent) {
            self.events
                .lock()
                .unwrap()
                .push((event.kind().to_string(), event.artifact().key().to_string()));
        }
    }

    fn jar(group: &str, artifact: &str, version: &str) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(
                format!("META-INF/maven/{}/{}/pom.properties", group, artifact),
                SimpleFileOptions::default(),
            )
            .unwrap();
        write!(
            writer,
            "groupId={}\nartifactId={}\nversion={}\n",
            group, artifact, version
        )
        .unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn pom(group: &str, artifact: &str, version: &str, packaging: &str) -> Vec<u8> {
        format!(
            "<project><groupId>{}</groupId><artifactId>{}</artifactId><version>{}</version><packaging>{}</packaging></project>",
            group, artifact, version, packaging
        )
        .into_bytes()
    }

    #[test]
    fn test_scan_disambiguates_descriptors() {
        let store = Arc::new(MemoryStore::new());
        store.insert("org/example/lib/1.0/lib-1.0.jar", jar("org.example", "lib", "1.0"));
        store.insert("org/example/lib/1.0/lib-1.0.pom", pom("org.example", "lib", "1.0", "pom"));
        store.insert("org/example/parent/1.0/parent-1.0.pom", pom("org.example", "parent", "1.0", "pom"));
        store.insert("org/example/plain/1.0/plain-1.0.pom", pom("org.example", "plain", "1.0", "jar"));
        store.insert("org/example/lib/1.0/lib-1.0.jar.sha1", b"abc".to_vec());
        store.insert("org/example/broken/1.0/broken-1.0.jar", b"garbage".to_vec());

        let repo = Repository::new(store);
        assert_eq!(repo.scan().unwrap(), 2);

        let keys: Vec<_> = repo.artifacts().iter().map(|a| a.key().to_string()).collect();
        assert_eq!(
            keys,
            vec![
                "org/example/lib/1.0/lib-1.0.jar".to_string(),
                "org/example/parent/1.0/parent-1.0.pom".to_string(),
            ]
        );
        assert_eq!(repo.list_groups(), vec!["org.example".to_string()]);
        assert_eq!(repo.list_artifacts("org.example"), vec!["lib", "parent"]);
    }

    #[test]
    fn test_scan_is_idempotent_and_non_recursive() {
        let store = Arc::new(MemoryStore::new());
        store.insert("top-1.0.jar", jar("g", "top", "1.0"));
        store.insert("g/nested/1.0/nested-1.0.jar", jar("g", "nested", "1.0"));

        let repo = Repository::new(store);
        assert_eq!(repo.scan_with(false).unwrap(), 1);
        assert_eq!(repo.scan_with(false).unwrap(), 0);
        assert_eq!(repo.scan().unwrap(), 1);
        assert_eq!(repo.scan().unwrap(), 0);
        assert_eq!(repo.len(), 2);
    }

    #[test]
    fn test_scan_uses_sibling_pom_without_properties() {
        let store = Arc::new(MemoryStore::new());
        let empty_archive = ZipWriter::new(Cursor::new(Vec::new()))
            .finish()
            .unwrap()
            .into_inner();
        store.insert("g/a/2.0/a-2.0.war", empty_archive);
        store.insert("g/a/2.0/a-2.0.pom", pom("g", "a", "2.0", "war"));

        let repo = Repository::new(store);
        repo.scan().unwrap();
        let found = repo.get_artifact("g", "a", "2.0", false).unwrap();
        assert_eq!(found.packaging(), "war");
    }

    #[test]
    fn test_create_replaces_and_notifies() {
        let store = Arc::new(MemoryStore::new());
        let sink = Arc::new(RecordingSink::default());
        let repo = Repository::new(store.clone()).with_sink(sink.clone());

        repo.create("org.example", "app", "1.0", "jar", &mut &b"first"[..], false)
            .unwrap();
        assert_eq!(sink.events.lock().unwrap().len(), 1);

        let second = repo
            .create("org.example", "app", "1.0", "war", &mut &b"second"[..], false)
            .unwrap();
        let events = sink.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                ("created".to_string(), "org/example/app/1.0/app-1.0.jar".to_string()),
                ("deleted".to_string(), "org/example/app/1.0/app-1.0.jar".to_string()),
                ("created".to_string(), "org/example/app/1.0/app-1.0.war".to_string()),
            ]
        );

        let found = repo.get_artifact("org.example", "app", "1.0", false).unwrap();
        assert_eq!(found.key(), second.key());
        assert_eq!(repo.len(), 1);

        let mut body = Vec::new();
        found.content().unwrap().read_to_end(&mut body).unwrap();
        assert_eq!(body, b"second");

        // The superseded jar is gone from the store, so a later scan cannot revive it
        assert!(store
            .child("org/example/app/1.0", "app-1.0.jar")
            .unwrap()
            .is_none());
        assert_eq!(repo.scan().unwrap(), 0);
        assert_eq!(repo.len(), 1);
        assert_eq!(sink.events.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_redeploy_same_key_keeps_position() {
        let store = Arc::new(MemoryStore::new());
        let repo = Repository::new(store.clone());
        repo.create("g", "a", "1", "jar", &mut &b"one"[..], false).unwrap();
        repo.create("g", "b", "1", "jar", &mut &b"two"[..], false).unwrap();
        repo.create("g", "a", "1", "jar", &mut &b"three"[..], false).unwrap();

        assert_eq!(repo.list_artifacts("g"), vec!["a", "b"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_create_test_variant_is_separate() {
        let repo = Repository::new(Arc::new(MemoryStore::new()));
        repo.create("g", "a", "1", "jar", &mut &b"main"[..], false).unwrap();
        let tests = repo.create("g", "a", "1", "jar", &mut &b"tests"[..], true).unwrap();
        assert_eq!(tests.key(), "g/a/1/a-1-tests.jar");
        assert_eq!(repo.list_versions("g", "a"), vec!["1"]);
        assert!(repo.get_artifact("g", "a", "1", true).is_some());
        assert!(repo.get_artifact("g", "a", "1", false).is_some());
    }

    #[test]
    fn test_create_rejects_invalid_and_read_only() {
        let repo = Repository::new(Arc::new(MemoryStore::new()));
        let err = repo
            .create("g", "../a", "1", "jar", &mut &b"x"[..], false)
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let frozen = Repository::new(Arc::new(MemoryStore::new().read_only()));
        let err = frozen
            .create("g", "a", "1", "jar", &mut &b"x"[..], false)
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_internal_flag_and_rebuild() {
        #[derive(Debug, Default)]
        struct InternalFlags(Mutex<Vec<bool>>);
        impl EventSink for InternalFlags {
            fn notify(&self, event: RepositoryEvent) {
                self.0.lock().unwrap().push(event.is_internal());
            }
        }

        let store = Arc::new(MemoryStore::new());
        let flags = Arc::new(InternalFlags::default());
        let repo = Repository::new(store.clone())
            .with_sink(flags.clone())
            .with_internal_groups(InternalGroups::new(["com.acme"]));
        repo.create("com.acme.core", "a", "1", "jar", &mut &b"x"[..], false).unwrap();
        repo.create("org.other", "b", "1", "jar", &mut &b"y"[..], false).unwrap();
        assert_eq!(*flags.0.lock().unwrap(), vec![true, false]);

        // Plain bytes carry no coordinates, so a rebuild drops them
        assert_eq!(repo.rebuild().unwrap(), 0);
        assert!(repo.is_empty());

        store.insert("g/c/1/c-1.jar", jar("g", "c", "1"));
        assert_eq!(repo.rebuild().unwrap(), 1);
        assert_eq!(repo.list_groups(), vec!["g"]);
    }
}
