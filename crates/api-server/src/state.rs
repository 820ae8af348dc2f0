//! Application state

use std::sync::Arc;

use todo_core::task::SharedTaskCollection;

use crate::config::Config;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    tasks: SharedTaskCollection,
    config: Config,
}

impl AppState {
    /// Create a new AppState with an empty task collection
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                tasks: SharedTaskCollection::new(),
                config,
            }),
        }
    }

    /// Get reference to the task collection
    pub fn tasks(&self) -> &SharedTaskCollection {
        &self.inner.tasks
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }
}
