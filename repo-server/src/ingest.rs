//! # Upload Protocol
//!
//! A Maven deploy PUTs every file of a release separately: the artifact and its
//! checksums, the POM and its checksums, then version and group metadata with
//! their checksums. Only one of those uploads is the artifact itself; the rest
//! are either regenerated on demand or are the artifact's companion POM.
//!
//! [`ingest_upload`] decides which upload is which and turns the real one into
//! a single [`Repository::create`] call.

use crate::artifact::Artifact;
use crate::coordinate::{extension, is_artifact_extension, is_test_file_name, DESCRIPTOR_EXTENSION};
use crate::descriptor::{parse_pom, read_embedded_properties};
use crate::error::{AppError, AppResult};
use crate::metadata::METADATA_FILE;
use crate::repository::Repository;
use crate::validation::validate_upload_size;
use std::io::Cursor;
use tracing::{debug, info};

/// Upload suffixes that are regenerated on demand or not tracked at all.
const IGNORED_SUFFIXES: [&str; 5] = [".md5", ".sha1", ".sha256", ".sha512", ".asc"];

#[derive(Debug, Clone)]
pub enum IngestOutcome {
    /// Metadata, checksum or signature upload.
    Ignored,
    /// Companion POM of a binary artifact; accepted but not stored.
    Acknowledged,
    Stored(Artifact),
}

/// Last path segment of an upload target.
pub fn upload_file_name(target: &str) -> &str {
    target
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(target)
}

pub fn is_ignored_upload(file_name: &str) -> bool {
    file_name == METADATA_FILE
        || IGNORED_SUFFIXES
            .iter()
            .any(|suffix| file_name.ends_with(suffix))
}

/// Handle one uploaded file.
pub fn ingest_upload(
    repository: &Repository,
    target: &str,
    body: &[u8],
    max_upload_size: u64,
) -> AppResult<IngestOutcome> {
    if !repository.is_writable() {
        return Err(AppError::Forbidden(
            "The repository does not support creation of new artifacts".to_string(),
        ));
    }

    let file_name = upload_file_name(target);
    if is_ignored_upload(file_name) {
        debug!(file = %file_name, "Ignoring generated upload");
        return Ok(IngestOutcome::Ignored);
    }

    if body.is_empty() {
        return Err(AppError::BadRequest("Expecting a content part".to_string()));
    }
    validate_upload_size(body.len() as u64, max_upload_size)
        .map_err(|e| AppError::UploadError(e.to_string()))?;

    let packaging = extension(file_name).ok_or_else(|| {
        AppError::BadRequest(format!("Upload '{}' has no file extension", file_name))
    })?;
    if !is_artifact_extension(&packaging) {
        return Err(AppError::BadRequest(format!(
            "Unsupported packaging '{}', expected jar, war or pom",
            packaging
        )));
    }

    let project = if packaging == DESCRIPTOR_EXTENSION {
        let descriptor = parse_pom(body)?;
        if !descriptor.declares_pom_packaging() {
            debug!(file = %file_name, "Acknowledging companion descriptor");
            return Ok(IngestOutcome::Acknowledged);
        }
        descriptor.project_id()?
    } else {
        read_embedded_properties(Cursor::new(body))?
    };

    let is_test = is_test_file_name(file_name);
    let artifact = repository.create(
        &project.group_id,
        &project.artifact_id,
        &project.version,
        &packaging,
        &mut &body[..],
        is_test,
    )?;
    info!(file = %file_name, coordinate = %artifact.coordinate(), "Stored upload");
    Ok(IngestOutcome::Stored(artifact))
}
