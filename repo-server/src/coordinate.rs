//! Repository coordinates and the file names derived from them.

use serde::Serialize;
use std::fmt;

/// Extension of descriptor files.
pub const DESCRIPTOR_EXTENSION: &str = "pom";

/// Archive packagings the repository stores and serves.
pub const BINARY_EXTENSIONS: [&str; 2] = ["jar", "war"];

/// Infix marking the test-classifier variant of an artifact.
pub const TEST_INFIX: &str = "-tests";

/// Identity of an artifact in the repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
    pub version: String,
    pub packaging: String,
    pub is_test: bool,
}

impl Coordinate {
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
        packaging: impl Into<String>,
        is_test: bool,
    ) -> Self {
        Coordinate {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
            packaging: packaging.into(),
            is_test,
        }
    }

    /// `<artifact>-<version>[-tests]`
    pub fn base_name(&self) -> String {
        let infix = if self.is_test { TEST_INFIX } else { "" };
        format!("{}-{}{}", self.artifact, self.version, infix)
    }

    /// `<artifact>-<version>[-tests].<packaging>`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.base_name(), self.packaging)
    }

    /// `<artifact>-<version>[-tests].pom`
    pub fn descriptor_file_name(&self) -> String {
        format!("{}.{}", self.base_name(), DESCRIPTOR_EXTENSION)
    }

    /// Group with dots expanded into path segments.
    pub fn group_path(&self) -> String {
        group_to_path(&self.group)
    }

    /// `<group/as/path>/<artifact>/<version>`
    pub fn directory(&self) -> String {
        format!("{}/{}/{}", self.group_path(), self.artifact, self.version)
    }

    /// Store location of the artifact file.
    pub fn relative_path(&self) -> String {
        format!("{}/{}", self.directory(), self.file_name())
    }

    pub fn is_descriptor_only(&self) -> bool {
        self.packaging == DESCRIPTOR_EXTENSION
    }

    /// Same group, artifact, version and test flag, whatever the packaging.
    pub fn matches(&self, group: &str, artifact: &str, version: &str, is_test: bool) -> bool {
        self.group == group
            && self.artifact == artifact
            && self.version == version
            && self.is_test == is_test
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.group, self.artifact, self.packaging, self.version
        )?;
        if self.is_test {
            write!(f, ":tests")?;
        }
        Ok(())
    }
}

pub fn group_to_path(group: &str) -> String {
    group.replace('.', "/")
}

/// Lower-cased extension after the last dot, if any.
pub fn extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Whether `ext` is a packaging the repository indexes.
pub fn is_artifact_extension(ext: &str) -> bool {
    ext == DESCRIPTOR_EXTENSION || BINARY_EXTENSIONS.contains(&ext)
}

/// Name without its last extension.
pub fn strip_extension(file_name: &str) -> &str {
    file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name)
}

/// True for names of the form `*-tests.<ext>`.
pub fn is_test_file_name(file_name: &str) -> bool {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) => !ext.is_empty() && stem.ends_with(TEST_INFIX),
        None => false,
    }
}
