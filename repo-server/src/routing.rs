//! # Request Path Resolution
//!
//! Maps a request path onto a repository operation. Group ids may be sent
//! either dotted (`org.example/demo/1.0/demo-1.0.jar`) or slash-expanded
//! (`org/example/demo/1.0/demo-1.0.jar`); [`RoutePath::normalize`] folds the
//! extra leading segments back into a dotted group in one step.
//!
//! | segments | route |
//! |----------|-------|
//! | 0 | group listing |
//! | 1 | `style.css`, else artifact listing of the group |
//! | 2 | version listing |
//! | 3 | `maven-metadata.xml[.md5\|.sha1]`, else version page |
//! | 4 | file inside a version directory |
//! | 5, last is metadata | group metadata, first three segments form the group |
//! | >4 | all but the last three segments form the group |

use crate::coordinate::{
    extension, is_test_file_name, strip_extension, BINARY_EXTENSIONS, DESCRIPTOR_EXTENSION,
};
use crate::hash_utils::ChecksumAlgorithm;
use crate::metadata::METADATA_FILE;

pub const STYLESHEET: &str = "style.css";

/// A resolved request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Groups,
    Stylesheet,
    Artifacts {
        group: String,
    },
    Versions {
        group: String,
        artifact: String,
    },
    GroupMetadata {
        group: String,
        artifact: String,
        checksum: Option<ChecksumAlgorithm>,
    },
    Version {
        group: String,
        artifact: String,
        version: String,
    },
    File {
        group: String,
        artifact: String,
        version: String,
        file: String,
    },
}

/// Path segments below the mount point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePath {
    segments: Vec<String>,
}

impl RoutePath {
    /// Strip `mount` from `path` and split the remainder into segments.
    ///
    /// Returns `None` when `path` lies outside the mount point. Empty segments
    /// are dropped.
    pub fn parse(path: &str, mount: &str) -> Option<Self> {
        let mount = mount.trim_end_matches('/');
        let rest = path.strip_prefix(mount)?;
        if !rest.is_empty() && !rest.starts_with('/') {
            return None;
        }
        Some(RoutePath {
            segments: rest
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_owned)
                .collect(),
        })
    }

    /// Fold slash-expanded groups into dotted form.
    pub fn normalize(mut self) -> Self {
        let n = self.segments.len();
        let group_len = if n == 5 && self.segments[4].starts_with(METADATA_FILE) {
            3
        } else if n > 4 {
            n - 3
        } else {
            return self;
        };
        let group = self.segments.drain(..group_len).collect::<Vec<_>>().join(".");
        self.segments.insert(0, group);
        self
    }

    pub fn resolve(self) -> Option<Route> {
        let mut segments = self.normalize().segments.into_iter();
        let route = match segments.len() {
            0 => Route::Groups,
            1 => {
                let first = segments.next()?;
                if first == STYLESHEET {
                    Route::Stylesheet
                } else {
                    Route::Artifacts { group: first }
                }
            }
            2 => Route::Versions {
                group: segments.next()?,
                artifact: segments.next()?,
            },
            3 => {
                let group = segments.next()?;
                let artifact = segments.next()?;
                let last = segments.next()?;
                match metadata_checksum(&last) {
                    Some(checksum) => Route::GroupMetadata {
                        group,
                        artifact,
                        checksum,
                    },
                    None => Route::Version {
                        group,
                        artifact,
                        version: last,
                    },
                }
            }
            4 => Route::File {
                group: segments.next()?,
                artifact: segments.next()?,
                version: segments.next()?,
                file: segments.next()?,
            },
            _ => return None,
        };
        Some(route)
    }
}

/// `Some(None)` for `maven-metadata.xml`, `Some(Some(alg))` for its checksums.
fn metadata_checksum(name: &str) -> Option<Option<ChecksumAlgorithm>> {
    let rest = name.strip_prefix(METADATA_FILE)?;
    if rest.is_empty() {
        return Some(None);
    }
    rest.strip_prefix('.')
        .and_then(ChecksumAlgorithm::from_extension)
        .map(Some)
}

/// What a file name inside a version directory asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Metadata,
    Descriptor,
    Binary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRequest {
    pub kind: FileKind,
    pub checksum: Option<ChecksumAlgorithm>,
    pub is_test: bool,
    /// Requested binary extension, lower-cased.
    pub extension: Option<String>,
}

impl FileRequest {
    /// Classify a file name. Unknown suffixes yield `None`.
    pub fn parse(file: &str) -> Option<Self> {
        if let Some(checksum) = metadata_checksum(file) {
            return Some(FileRequest {
                kind: FileKind::Metadata,
                checksum,
                is_test: false,
                extension: None,
            });
        }

        let (target, checksum) = match extension(file)
            .as_deref()
            .and_then(ChecksumAlgorithm::from_extension)
        {
            Some(algorithm) => (strip_extension(file), Some(algorithm)),
            None => (file, None),
        };

        let ext = extension(target)?;
        let kind = if ext == DESCRIPTOR_EXTENSION {
            FileKind::Descriptor
        } else if BINARY_EXTENSIONS.contains(&ext.as_str()) {
            FileKind::Binary
        } else {
            return None;
        };

        Some(FileRequest {
            kind,
            checksum,
            is_test: is_test_file_name(target),
            extension: (kind == FileKind::Binary).then_some(ext),
        })
    }
}
