//! Notifications emitted when the repository contents change.

use crate::artifact::Artifact;
use std::fmt;
use tracing::info;

#[derive(Debug, Clone)]
pub enum RepositoryEvent {
    Created { artifact: Artifact, internal: bool },
    Deleted { artifact: Artifact, internal: bool },
}

impl RepositoryEvent {
    pub fn artifact(&self) -> &Artifact {
        match self {
            RepositoryEvent::Created { artifact, .. } | RepositoryEvent::Deleted { artifact, .. } => {
                artifact
            }
        }
    }

    pub fn is_internal(&self) -> bool {
        match self {
            RepositoryEvent::Created { internal, .. } | RepositoryEvent::Deleted { internal, .. } => {
                *internal
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RepositoryEvent::Created { .. } => "created",
            RepositoryEvent::Deleted { .. } => "deleted",
        }
    }
}

/// Receiver of repository events. Called synchronously from `create`.
pub trait EventSink: Send + Sync + fmt::Debug {
    fn notify(&self, event: RepositoryEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn notify(&self, _event: RepositoryEvent) {}
}

/// Logs every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn notify(&self, event: RepositoryEvent) {
        let artifact = event.artifact();
        info!(
            event = event.kind(),
            coordinate = %artifact.coordinate(),
            key = %artifact.key(),
            internal = event.is_internal(),
            "Repository changed"
        );
    }
}

/// Decides which groups count as internal.
///
/// A group is internal when it equals one of the configured prefixes or starts
/// with `<prefix>.`.
#[derive(Debug, Clone, Default)]
pub struct InternalGroups {
    prefixes: Vec<String>,
}

impl InternalGroups {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        InternalGroups {
            prefixes: prefixes
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    pub fn is_internal(&self, group: &str) -> bool {
        self.prefixes.iter().any(|prefix| {
            group == prefix
                || group
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }
}
