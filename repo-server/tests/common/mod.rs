//! Common test utilities and helpers
//!
//! Builders for the archives and descriptors a Maven client uploads, plus a
//! test server backed by a temporary repository directory.

#![allow(dead_code)]

use axum_test::TestServer;
use repo_server::{
    build_router, AppState, Config, EventSink, FsStore, RepositoryEvent,
};
use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Records `(kind, key)` for every event.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<(String, String)> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn notify(&self, event: RepositoryEvent) {
        self.events
            .lock()
            .unwrap()
            .push((event.kind().to_string(), event.artifact().key().to_string()));
    }
}

/// Test server setup result
pub struct TestRepo {
    pub temp_dir: TempDir,
    pub server: TestServer,
    pub state: AppState,
    pub sink: Arc<RecordingSink>,
}

impl TestRepo {
    pub fn root(&self) -> &std::path::Path {
        self.temp_dir.path()
    }

    /// Place a file directly in the repository directory.
    pub fn put_file(&self, relative: &str, content: &[u8]) {
        let path = self.temp_dir.path().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
}

/// Creates a server over an empty temporary repository.
pub fn create_test_repo() -> TestRepo {
    create_test_repo_with(Config::default())
}

pub fn create_test_repo_with(mut config: Config) -> TestRepo {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    config.storage.root = temp_dir.path().to_path_buf();

    let store = FsStore::open(temp_dir.path(), config.storage.read_only)
        .expect("Failed to open store");
    let sink = Arc::new(RecordingSink::default());
    let state = AppState::with_store(Arc::new(store), config, sink.clone());
    let server = TestServer::new(build_router(state.clone())).expect("Failed to create test server");

    TestRepo {
        temp_dir,
        server,
        state,
        sink,
    }
}

/// A jar/war archive carrying Maven's embedded `pom.properties`.
pub fn archive_bytes(group: &str, artifact: &str, version: &str) -> Vec<u8> {
    archive_bytes_with(group, artifact, version, &[0xca, 0xfe, 0xba, 0xbe])
}

/// Like [`archive_bytes`], with `class_bytes` as the single class file.
pub fn archive_bytes_with(group: &str, artifact: &str, version: &str, class_bytes: &[u8]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    writer.start_file("META-INF/MANIFEST.MF", options).unwrap();
    writer.write_all(b"Manifest-Version: 1.0\n").unwrap();

    writer
        .start_file(
            format!("META-INF/maven/{}/{}/pom.properties", group, artifact),
            options,
        )
        .unwrap();
    write!(
        writer,
        "#Generated by Maven\ngroupId={}\nartifactId={}\nversion={}\n",
        group, artifact, version
    )
    .unwrap();

    writer
        .start_file(format!("META-INF/maven/{}/{}/pom.xml", group, artifact), options)
        .unwrap();
    writer
        .write_all(&pom_bytes(group, artifact, version, "jar"))
        .unwrap();

    writer.start_file("com/example/Main.class", options).unwrap();
    writer.write_all(class_bytes).unwrap();

    writer.finish().unwrap().into_inner()
}

/// An archive with no Maven metadata inside.
pub fn bare_archive_bytes() -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("index.html", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"<html></html>").unwrap();
    writer.finish().unwrap().into_inner()
}

pub fn pom_bytes(group: &str, artifact: &str, version: &str, packaging: &str) -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <groupId>{}</groupId>
  <artifactId>{}</artifactId>
  <version>{}</version>
  <packaging>{}</packaging>
</project>
"#,
        group, artifact, version, packaging
    )
    .into_bytes()
}

/// A POM inheriting group and version from its parent.
pub fn child_pom_bytes(parent_group: &str, artifact: &str, parent_version: &str) -> Vec<u8> {
    format!(
        r#"<project>
  <parent>
    <groupId>{}</groupId>
    <artifactId>parent</artifactId>
    <version>{}</version>
  </parent>
  <artifactId>{}</artifactId>
  <packaging>pom</packaging>
</project>
"#,
        parent_group, parent_version, artifact
    )
    .into_bytes()
}
