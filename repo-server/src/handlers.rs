//! # Request Handlers
//!
//! Transport-independent handling of repository requests. Each function runs
//! synchronously against the [`Repository`](crate::repository::Repository) and
//! returns a [`RepoResponse`] that the HTTP layer turns into a real response.
//! The index is refreshed with a scan before every request.

use crate::artifact::Artifact;
use crate::coordinate::group_to_path;
use crate::error::{AppError, AppResult};
use crate::hash_utils::{checksum_line, ChecksumAlgorithm};
use crate::ingest::{ingest_upload, IngestOutcome};
use crate::metadata::{artifact_metadata, group_metadata, METADATA_FILE};
use crate::routing::{FileKind, FileRequest, Route, RoutePath};
use crate::state::AppState;
use crate::storage::Blob;
use crate::ui::{self, FileEntry, DEFAULT_STYLESHEET};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use std::io::{self, Read};
use tracing::debug;

pub const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";
pub const CONTENT_TYPE_CSS: &str = "text/css";
pub const CONTENT_TYPE_XML: &str = "application/xml";
pub const CONTENT_TYPE_CHECKSUM: &str = "text/plain";

/// A fully materialized response.
#[derive(Debug, Clone, PartialEq)]
pub struct RepoResponse {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub last_modified: Option<DateTime<Utc>>,
    pub body: Vec<u8>,
}

impl RepoResponse {
    pub fn ok(content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        RepoResponse {
            status: StatusCode::OK,
            content_type,
            last_modified: None,
            body: body.into(),
        }
    }

    pub fn html(body: String) -> Self {
        Self::ok(CONTENT_TYPE_HTML, body)
    }

    /// Empty 200 acknowledging an upload.
    pub fn accepted() -> Self {
        Self::ok(CONTENT_TYPE_CHECKSUM, Vec::new())
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }
}

fn content_type_for(packaging: &str) -> &'static str {
    match packaging {
        "jar" | "war" => "application/java-archive",
        "pom" => CONTENT_TYPE_XML,
        _ => "application/octet-stream",
    }
}

fn not_found(what: impl std::fmt::Display) -> AppError {
    AppError::NotFound(format!("Can not find {}", what))
}

fn refresh(state: &AppState) -> AppResult<()> {
    state
        .repository
        .scan_with(state.config.repository.recursive_scan)?;
    Ok(())
}

/// Answer a GET (or HEAD) for `path`.
pub fn handle_get(state: &AppState, path: &str) -> AppResult<RepoResponse> {
    refresh(state)?;
    let route = RoutePath::parse(path, &state.base)
        .and_then(RoutePath::resolve)
        .ok_or_else(|| not_found(path))?;
    debug!(path = %path, route = ?route, "Resolved request");

    let repository = &state.repository;
    let base = state.base.as_str();
    match route {
        Route::Groups => Ok(RepoResponse::html(ui::render_groups(
            base,
            &repository.list_groups(),
        )?)),
        Route::Stylesheet => stylesheet(state),
        Route::Artifacts { group } => Ok(RepoResponse::html(ui::render_artifacts(
            base,
            &group,
            &repository.list_artifacts(&group),
        )?)),
        Route::Versions { group, artifact } => Ok(RepoResponse::html(ui::render_versions(
            base,
            &group,
            &artifact,
            &repository.list_versions(&group, &artifact),
        )?)),
        Route::GroupMetadata {
            group,
            artifact,
            checksum,
        } => serve_group_metadata(state, &group, &artifact, checksum),
        Route::Version {
            group,
            artifact,
            version,
        } => serve_version_page(state, &group, &artifact, &version),
        Route::File {
            group,
            artifact,
            version,
            file,
        } => serve_file(state, &group, &artifact, &version, &file),
    }
}

/// Accept one file of a deploy sequence.
pub fn handle_put(state: &AppState, path: &str, body: &[u8]) -> AppResult<RepoResponse> {
    if RoutePath::parse(path, &state.base).is_none() {
        return Err(not_found(path));
    }
    refresh(state)?;
    match ingest_upload(
        &state.repository,
        path,
        body,
        state.config.max_upload_size_bytes(),
    )? {
        IngestOutcome::Stored(artifact) => {
            debug!(key = %artifact.key(), "Upload stored");
        }
        IngestOutcome::Acknowledged | IngestOutcome::Ignored => {}
    }
    Ok(RepoResponse::accepted())
}

fn stylesheet(state: &AppState) -> AppResult<RepoResponse> {
    let body = match &state.config.repository.stylesheet {
        Some(path) => std::fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => not_found("the stylesheet"),
            _ => AppError::Io(e),
        })?,
        None => DEFAULT_STYLESHEET.as_bytes().to_vec(),
    };
    Ok(RepoResponse::ok(CONTENT_TYPE_CSS, body))
}

fn serve_group_metadata(
    state: &AppState,
    group: &str,
    artifact: &str,
    checksum: Option<ChecksumAlgorithm>,
) -> AppResult<RepoResponse> {
    let artifacts = state.repository.versions_of(group, artifact);
    let newest = artifacts.iter().map(Artifact::last_modified).max();
    let (Some(xml), Some(newest)) = (group_metadata(group, artifact, &artifacts)?, newest) else {
        return Err(not_found(format!("metadata for {}:{}", group, artifact)));
    };
    let directory = format!("{}/{}", group_to_path(group), artifact);
    let response = document_response(xml, checksum, &directory, METADATA_FILE);
    Ok(response.with_last_modified(newest))
}

fn document_response(
    xml: Vec<u8>,
    checksum: Option<ChecksumAlgorithm>,
    directory: &str,
    file_name: &str,
) -> RepoResponse {
    match checksum {
        Some(algorithm) => RepoResponse::ok(
            CONTENT_TYPE_CHECKSUM,
            checksum_line(&algorithm.hash_bytes(&xml), directory, file_name),
        ),
        None => RepoResponse::ok(CONTENT_TYPE_XML, xml),
    }
}

fn stream_response(
    mut blob: Box<dyn Blob>,
    content_type: &'static str,
    checksum: Option<ChecksumAlgorithm>,
    directory: &str,
    file_name: &str,
) -> AppResult<RepoResponse> {
    match checksum {
        Some(algorithm) => {
            let hex = algorithm.hash_reader(&mut blob)?;
            Ok(RepoResponse::ok(
                CONTENT_TYPE_CHECKSUM,
                checksum_line(&hex, directory, file_name),
            ))
        }
        None => {
            let mut body = Vec::new();
            blob.read_to_end(&mut body)?;
            Ok(RepoResponse::ok(content_type, body))
        }
    }
}

fn serve_file(
    state: &AppState,
    group: &str,
    artifact_id: &str,
    version: &str,
    file: &str,
) -> AppResult<RepoResponse> {
    let request = FileRequest::parse(file).ok_or_else(|| not_found(file))?;
    let artifact = state
        .repository
        .get_artifact(group, artifact_id, version, request.is_test)
        .ok_or_else(|| not_found(format!("the artifact {}:{}:{}", group, artifact_id, version)))?;
    let coordinate = artifact.coordinate();
    let directory = coordinate.directory();
    let last_modified = artifact.last_modified();

    let response = match request.kind {
        FileKind::Metadata => document_response(
            artifact_metadata(&artifact)?,
            request.checksum,
            &directory,
            METADATA_FILE,
        ),
        FileKind::Descriptor => {
            let descriptor = artifact
                .descriptor()?
                .ok_or_else(|| not_found(format!("a descriptor for {}", coordinate)))?;
            stream_response(
                descriptor,
                CONTENT_TYPE_XML,
                request.checksum,
                &directory,
                &coordinate.descriptor_file_name(),
            )?
        }
        FileKind::Binary => {
            if request.extension.as_deref() != Some(artifact.packaging()) {
                return Err(not_found(file));
            }
            stream_response(
                artifact.content()?,
                content_type_for(artifact.packaging()),
                request.checksum,
                &directory,
                &coordinate.file_name(),
            )?
        }
    };
    Ok(response.with_last_modified(last_modified))
}

fn file_entry(dir_href: &str, name: String) -> FileEntry {
    FileEntry {
        href: format!("{}/{}", dir_href, name),
        name,
    }
}

fn serve_version_page(
    state: &AppState,
    group: &str,
    artifact_id: &str,
    version: &str,
) -> AppResult<RepoResponse> {
    let repository = &state.repository;
    let main = repository.get_artifact(group, artifact_id, version, false);
    let tests = repository.get_artifact(group, artifact_id, version, true);
    let Some(primary) = main.as_ref().or(tests.as_ref()) else {
        return Err(not_found(format!(
            "the artifact {}:{}:{}",
            group, artifact_id, version
        )));
    };

    let dir_href = format!("{}/{}/{}/{}", state.base, group, artifact_id, version);
    let mut files = Vec::new();
    for artifact in main.iter().chain(tests.iter()) {
        let coordinate = artifact.coordinate();
        if !coordinate.is_descriptor_only() {
            files.push(file_entry(&dir_href, coordinate.file_name()));
        }
        if artifact.descriptor()?.is_some() {
            files.push(file_entry(&dir_href, coordinate.descriptor_file_name()));
        }
    }
    files.push(file_entry(&dir_href, METADATA_FILE.to_string()));

    let html = ui::render_version(&state.base, primary, files)?;
    Ok(RepoResponse::html(html).with_last_modified(primary.last_modified()))
}
