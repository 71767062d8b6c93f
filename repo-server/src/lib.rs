//! # Maven Repository Server
//!
//! A package repository that stores and serves versioned build artifacts over
//! HTTP using the Maven repository layout and deploy protocol.
//!
//! ## Features
//!
//! - **Maven layout**: serves `<group>/<artifact>/<version>/<file>` paths, with
//!   group ids either dotted or slash-expanded
//! - **Deploy protocol**: accepts the per-file PUT sequence of `mvn deploy` and
//!   keeps only the artifact itself
//! - **Generated files**: `maven-metadata.xml` and `.md5`/`.sha1` checksums are
//!   produced on demand, never stored
//! - **Web UI**: browsable listings of groups, artifacts and versions
//!
//! ## Key Modules
//!
//! - [`repository`]: the artifact index, scanning and creation
//! - [`ingest`]: classification of uploaded files
//! - [`routing`]: request path resolution
//! - [`handlers`]: request handling independent of the HTTP stack
//! - [`storage`]: the hierarchical store abstraction
//! - [`config`]: configuration management and settings
//! - [`error`]: error handling and standardized responses

pub mod artifact;
pub mod config;
pub mod coordinate;
pub mod descriptor;
pub mod error;
pub mod events;
pub mod handlers;
pub mod hash_utils;
pub mod ingest;
pub mod metadata;
pub mod repository;
pub mod routing;
pub mod server;
pub mod state;
pub mod storage;
pub mod ui;
pub mod validation;

// Re-export key types for convenience
pub use artifact::Artifact;
pub use config::Config;
pub use coordinate::Coordinate;
pub use error::{ApiErrorResponse, AppError, AppResult, ErrorCode};
pub use events::{EventSink, InternalGroups, NoopSink, RepositoryEvent, TracingSink};
pub use hash_utils::{checksum_line, ChecksumAlgorithm};
pub use repository::Repository;
pub use server::{build_router, run_server};
pub use state::AppState;
pub use storage::{FsStore, MemoryStore, Store};
pub use validation::{ValidationError, ValidationResult};
