//! # Input Validation: Coordinates and Upload Limits
//!
//! Every coordinate segment that ends up in a storage path goes through these
//! checks before anything is written, so an upload can never address a location
//! outside its `<group>/<artifact>/<version>` directory.

/// Maximum allowed group length (dotted form)
pub const MAX_GROUP_LENGTH: usize = 255;

/// Maximum allowed artifact id length
pub const MAX_ARTIFACT_LENGTH: usize = 128;

/// Maximum allowed version string length
pub const MAX_VERSION_LENGTH: usize = 128;

/// Maximum allowed packaging (file extension) length
pub const MAX_PACKAGING_LENGTH: usize = 16;

/// Default upload limit (100 MB)
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 100 * 1024 * 1024;

/// Error types for validation failures
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} too long: {actual} exceeds maximum {max}")]
    TooLong {
        field: &'static str,
        actual: usize,
        max: usize,
    },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("Invalid characters in {field}: {input}")]
    InvalidCharacters { field: &'static str, input: String },

    #[error("Path traversal detected: {path}")]
    PathTraversal { path: String },

    #[error("File size exceeds limit: {actual} > {max}")]
    FileTooLarge { actual: u64, max: u64 },

    #[error("Contains null bytes")]
    NullBytes,

    #[error("Contains control characters")]
    ControlCharacters,
}

pub type ValidationResult<T> = Result<T, ValidationError>;

fn validate_segment(field: &'static str, value: &str, max: usize) -> ValidationResult<()> {
    if value.is_empty() {
        return Err(ValidationError::Empty { field });
    }

    if value.len() > max {
        return Err(ValidationError::TooLong {
            field,
            actual: value.len(),
            max,
        });
    }

    if value.contains('\0') {
        return Err(ValidationError::NullBytes);
    }

    if value.chars().any(|c| c.is_control()) {
        return Err(ValidationError::ControlCharacters);
    }

    if value.contains("..") {
        return Err(ValidationError::PathTraversal {
            path: value.to_string(),
        });
    }

    // Letters, numbers, dots, hyphens, underscores, plus
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '+'))
    {
        return Err(ValidationError::InvalidCharacters {
            field,
            input: value.to_string(),
        });
    }

    Ok(())
}

/// Validate a dotted group id such as `org.example.tools`.
pub fn validate_group(group: &str) -> ValidationResult<()> {
    validate_segment("groupId", group, MAX_GROUP_LENGTH)?;
    if group.starts_with('.') || group.ends_with('.') {
        return Err(ValidationError::InvalidCharacters {
            field: "groupId",
            input: group.to_string(),
        });
    }
    Ok(())
}

/// Validate an artifact id.
pub fn validate_artifact_id(artifact: &str) -> ValidationResult<()> {
    validate_segment("artifactId", artifact, MAX_ARTIFACT_LENGTH)?;
    if artifact == "." {
        return Err(ValidationError::PathTraversal {
            path: artifact.to_string(),
        });
    }
    Ok(())
}

/// Validate a version string.
pub fn validate_version(version: &str) -> ValidationResult<()> {
    validate_segment("version", version, MAX_VERSION_LENGTH)?;
    if version == "." {
        return Err(ValidationError::PathTraversal {
            path: version.to_string(),
        });
    }
    Ok(())
}

/// Packaging doubles as the file extension, so only letters and digits pass.
pub fn validate_packaging(packaging: &str) -> ValidationResult<()> {
    validate_segment("packaging", packaging, MAX_PACKAGING_LENGTH)?;
    if !packaging.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidCharacters {
            field: "packaging",
            input: packaging.to_string(),
        });
    }
    Ok(())
}

/// Validate all three path-forming parts of a coordinate.
pub fn validate_coordinate(group: &str, artifact: &str, version: &str) -> ValidationResult<()> {
    validate_group(group)?;
    validate_artifact_id(artifact)?;
    validate_version(version)
}

/// Check an upload body length against the configured limit.
pub fn validate_upload_size(size: u64, max: u64) -> ValidationResult<()> {
    if size > max {
        return Err(ValidationError::FileTooLarge { actual: size, max });
    }
    Ok(())
}
