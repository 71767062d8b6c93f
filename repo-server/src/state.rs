//! # Application State
//!
//! [`AppState`] is built once at startup and shared by every request handler
//! behind an `Arc`.

use crate::config::Config;
use crate::events::{EventSink, InternalGroups};
use crate::repository::Repository;
use crate::storage::{FsStore, Store};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AppState {
    pub repository: Arc<Repository>,
    pub config: Arc<Config>,
    /// Mount prefix without trailing slash, used for generated links
    pub base: String,
}

impl AppState {
    /// Open the configured filesystem store and wrap it in a repository.
    pub fn from_config(config: Config, sink: Arc<dyn EventSink>) -> std::io::Result<Self> {
        let store = FsStore::open(&config.storage.root, config.storage.read_only)?;
        Ok(Self::with_store(Arc::new(store), config, sink))
    }

    /// Build state around an already opened store.
    pub fn with_store(store: Arc<dyn Store>, config: Config, sink: Arc<dyn EventSink>) -> Self {
        let repository = Repository::new(store)
            .with_sink(sink)
            .with_internal_groups(InternalGroups::new(
                config.repository.internal_groups.iter().cloned(),
            ));
        AppState {
            base: config.mount_base(),
            repository: Arc::new(repository),
            config: Arc::new(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NoopSink;
    use tempfile::TempDir;

    #[test]
    fn test_from_config_opens_store() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.root = dir.path().join("repo");
        config.server.mount = "/maven/".to_string();
        config.repository.internal_groups = vec!["com.acme".to_string()];

        let state = AppState::from_config(config, Arc::new(NoopSink)).unwrap();
        assert!(dir.path().join("repo").is_dir());
        assert_eq!(state.base, "/maven");
        assert!(state.repository.is_writable());
        assert!(state.repository.is_internal("com.acme.core"));
    }
}
