//! Integration tests for browsing and downloading from the repository

mod common;

use axum::http::{Method, StatusCode};
use common::{archive_bytes, create_test_repo, create_test_repo_with, pom_bytes, TestRepo};
use repo_server::{ChecksumAlgorithm, Config};

const GROUP_DIR: &str = "org/example/tools";

/// A three-level group with one jar and its companion POM on disk.
fn populated_repo() -> (TestRepo, Vec<u8>, Vec<u8>) {
    let repo = create_test_repo();
    let jar = archive_bytes("org.example.tools", "demo", "2.1");
    let pom = pom_bytes("org.example.tools", "demo", "2.1", "jar");
    repo.put_file(&format!("{}/demo/2.1/demo-2.1.jar", GROUP_DIR), &jar);
    repo.put_file(&format!("{}/demo/2.1/demo-2.1.pom", GROUP_DIR), &pom);
    (repo, jar, pom)
}

#[tokio::test]
async fn test_listings_reflect_store() {
    let (repo, _, _) = populated_repo();
    repo.put_file(
        "org/example/parent/1.0/parent-1.0.pom",
        &pom_bytes("org.example", "parent", "1.0", "pom"),
    );
    repo.put_file(
        "com/acme/widget/0.1/widget-0.1.jar",
        &archive_bytes("com.acme", "widget", "0.1"),
    );

    let groups = repo.server.get("/").await;
    groups.assert_status_ok();
    assert_eq!(groups.header("content-type"), "text/html; charset=utf-8");
    let html = groups.text();
    assert!(html.contains("org.example.tools"));
    assert!(html.contains("com.acme"));
    assert!(html.contains(">org.example<"));

    let artifacts = repo.server.get("/org.example.tools/").await.text();
    assert!(artifacts.contains("demo"));

    let versions = repo.server.get("/org.example.tools/demo/").await.text();
    assert!(versions.contains("2.1"));

    // The companion POM is part of the jar artifact, not an artifact of its own.
    assert_eq!(repo.state.repository.len(), 3);
    assert!(repo
        .state
        .repository
        .artifacts()
        .iter()
        .all(|artifact| !artifact.key().ends_with("demo-2.1.pom")));
}

#[tokio::test]
async fn test_empty_repository_listing() {
    let repo = create_test_repo();
    let response = repo.server.get("/").await;
    response.assert_status_ok();
    assert!(response.text().contains("The repository is empty."));
}

#[tokio::test]
async fn test_dotted_and_expanded_paths_match() {
    let (repo, _, _) = populated_repo();

    for (dotted, expanded) in [
        (
            "/org.example.tools/demo/2.1/demo-2.1.jar",
            "/org/example/tools/demo/2.1/demo-2.1.jar",
        ),
        (
            "/org.example.tools/demo/2.1/demo-2.1.jar.sha1",
            "/org/example/tools/demo/2.1/demo-2.1.jar.sha1",
        ),
        (
            "/org.example.tools/demo/2.1/demo-2.1.pom",
            "/org/example/tools/demo/2.1/demo-2.1.pom",
        ),
        (
            "/org.example.tools/demo/2.1/demo-2.1.pom.md5",
            "/org/example/tools/demo/2.1/demo-2.1.pom.md5",
        ),
        (
            "/org.example.tools/demo/maven-metadata.xml",
            "/org/example/tools/demo/maven-metadata.xml",
        ),
        (
            "/org.example.tools/demo/maven-metadata.xml.sha1",
            "/org/example/tools/demo/maven-metadata.xml.sha1",
        ),
        (
            "/org.example.tools/demo/2.1/maven-metadata.xml",
            "/org/example/tools/demo/2.1/maven-metadata.xml",
        ),
    ] {
        let first = repo.server.get(dotted).await;
        let second = repo.server.get(expanded).await;
        first.assert_status_ok();
        second.assert_status_ok();
        assert_eq!(first.as_bytes(), second.as_bytes(), "{}", dotted);
        assert_eq!(
            first.header("content-type"),
            second.header("content-type"),
            "{}",
            dotted
        );
    }
}

#[tokio::test]
async fn test_checksum_lines() {
    let (repo, jar, pom) = populated_repo();

    let md5 = repo
        .server
        .get("/org.example.tools/demo/2.1/demo-2.1.jar.md5")
        .await;
    md5.assert_status_ok();
    assert_eq!(md5.header("content-type"), "text/plain");
    let line = md5.text();
    let (hex, path) = line.split_once(' ').unwrap();
    assert_eq!(hex.len(), 32);
    assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    assert_eq!(hex, ChecksumAlgorithm::Md5.hash_bytes(&jar));
    assert_eq!(path, "org/example/tools/demo/2.1/demo-2.1.jar");

    let sha1 = repo
        .server
        .get("/org.example.tools/demo/2.1/demo-2.1.jar.sha1")
        .await
        .text();
    let (jar_hex, _) = sha1.split_once(' ').unwrap();
    assert_eq!(jar_hex.len(), 40);
    assert_eq!(jar_hex, ChecksumAlgorithm::Sha1.hash_bytes(&jar));

    let pom_sha1 = repo
        .server
        .get("/org.example.tools/demo/2.1/demo-2.1.pom.sha1")
        .await
        .text();
    let (pom_hex, pom_path) = pom_sha1.split_once(' ').unwrap();
    assert_eq!(pom_hex, ChecksumAlgorithm::Sha1.hash_bytes(&pom));
    assert_eq!(pom_path, "org/example/tools/demo/2.1/demo-2.1.pom");
    assert_ne!(jar_hex, pom_hex);

    let metadata = repo
        .server
        .get("/org.example.tools/demo/maven-metadata.xml")
        .await;
    let metadata_md5 = repo
        .server
        .get("/org.example.tools/demo/maven-metadata.xml.md5")
        .await
        .text();
    assert_eq!(
        metadata_md5,
        format!(
            "{} org/example/tools/demo/maven-metadata.xml",
            ChecksumAlgorithm::Md5.hash_bytes(metadata.as_bytes())
        )
    );
}

#[tokio::test]
async fn test_version_metadata_document() {
    let (repo, _, _) = populated_repo();
    let response = repo
        .server
        .get("/org.example.tools/demo/2.1/maven-metadata.xml")
        .await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "application/xml");
    let xml = response.text();
    assert!(xml.contains("<groupId>org.example.tools</groupId>"));
    assert!(xml.contains("<artifactId>demo</artifactId>"));
    assert!(xml.contains("<version>2.1</version>"));
    assert!(xml.contains("<lastUpdated>"));
    assert!(!xml.contains("<versions>"));
}

#[tokio::test]
async fn test_version_page_links_checksums() {
    let (repo, jar, pom) = populated_repo();
    let response = repo.server.get("/org.example.tools/demo/2.1/").await;
    response.assert_status_ok();
    let html = response.text();
    for file in ["demo-2.1.jar", "demo-2.1.pom", "maven-metadata.xml"] {
        assert!(html.contains(&format!("{}\"", file)), "{}", file);
        assert!(html.contains(&format!("{}.md5\"", file)), "{}", file);
        assert!(html.contains(&format!("{}.sha1\"", file)), "{}", file);
    }
    assert!(!html.contains(&ChecksumAlgorithm::Sha1.hash_bytes(&jar)));
    assert!(!html.contains(&ChecksumAlgorithm::Md5.hash_bytes(&pom)));

    // Each linked checksum resolves.
    repo.server
        .get("/org.example.tools/demo/2.1/demo-2.1.jar.sha1")
        .await
        .assert_status_ok();
    repo.server
        .get("/org.example.tools/demo/2.1/maven-metadata.xml.md5")
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_stylesheet() {
    let repo = create_test_repo();
    let response = repo.server.get("/style.css").await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "text/css");
    assert!(!response.as_bytes().is_empty());
}

#[tokio::test]
async fn test_stylesheet_override() {
    let css = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(css.path(), "body { color: red; }").unwrap();
    let mut config = Config::default();
    config.repository.stylesheet = Some(css.path().to_path_buf());
    let repo = create_test_repo_with(config);

    let response = repo.server.get("/style.css").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "body { color: red; }");
}

#[tokio::test]
async fn test_head_and_last_modified() {
    let (repo, _, _) = populated_repo();
    let response = repo
        .server
        .method(Method::HEAD, "/org.example.tools/demo/2.1/demo-2.1.jar")
        .await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "application/java-archive");

    let last_modified = response.header("last-modified");
    let value = last_modified.to_str().unwrap();
    assert!(value.ends_with(" GMT"), "{}", value);
    assert!(chrono::DateTime::parse_from_rfc2822(value).is_ok(), "{}", value);

    // Listings carry no timestamp.
    let listing = repo.server.get("/org.example.tools/").await;
    assert!(listing.maybe_header("last-modified").is_none());
}

#[tokio::test]
async fn test_unknown_paths_are_not_found() {
    let (repo, _, _) = populated_repo();
    for path in [
        "/org.example.tools/demo/9.9/demo-9.9.jar",
        "/org.example.tools/demo/2.1/demo-2.1.war",
        "/org.example.tools/demo/2.1/demo-2.1-tests.jar",
        "/org.example.tools/other/maven-metadata.xml",
        "/org.example.tools/demo/3.0/",
    ] {
        let response = repo.server.get(path).await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "not_found", "{}", path);
    }
}

#[tokio::test]
async fn test_files_added_behind_the_server_are_found() {
    let repo = create_test_repo();
    repo.server
        .get("/org.example/late/1.0/late-1.0.jar")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let jar = archive_bytes("org.example", "late", "1.0");
    repo.put_file("org/example/late/1.0/late-1.0.jar", &jar);

    let response = repo.server.get("/org.example/late/1.0/late-1.0.jar").await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), jar.as_slice());
}

#[tokio::test]
async fn test_rebuild_forgets_removed_files() {
    let (repo, _, _) = populated_repo();
    repo.server
        .get("/org.example.tools/demo/2.1/demo-2.1.jar")
        .await
        .assert_status_ok();

    std::fs::remove_file(repo.root().join(GROUP_DIR).join("demo/2.1/demo-2.1.jar")).unwrap();
    repo.state.repository.rebuild().unwrap();

    repo.server
        .get("/org.example.tools/demo/2.1/demo-2.1.jar")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    assert!(repo.state.repository.is_empty());
}

#[tokio::test]
async fn test_browsing_under_mount_prefix() {
    let mut config = Config::default();
    config.server.mount = "/maven".to_string();
    let repo = create_test_repo_with(config);
    repo.put_file(
        "org/example/parent/1.0/parent-1.0.pom",
        &pom_bytes("org.example", "parent", "1.0", "pom"),
    );

    let listing = repo.server.get("/maven/").await;
    listing.assert_status_ok();
    assert!(listing.text().contains("org.example"));

    repo.server
        .get("/maven/style.css")
        .await
        .assert_status_ok();
    repo.server
        .get("/maven/org.example/parent/1.0/parent-1.0.pom")
        .await
        .assert_status_ok();
    repo.server
        .get("/style.css")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
