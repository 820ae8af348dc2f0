//! Lock-guarded task collection shared between request handlers

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::collection::TaskCollection;
use super::model::{NewTask, Task, TaskPatch};
use super::query::{TaskPage, TaskQuery};
use super::repository::TaskRepository;
use crate::Result;

/// Thread-safe handle to a single [`TaskCollection`]
///
/// Mutations hold the write lock for their whole duration, so readers never
/// see a half-applied change. Clones share the same collection.
#[derive(Clone, Default)]
pub struct SharedTaskCollection {
    inner: Arc<RwLock<TaskCollection>>,
}

impl SharedTaskCollection {
    /// Create a handle around an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handle around an existing collection
    pub fn from_collection(collection: TaskCollection) -> Self {
        Self {
            inner: Arc::new(RwLock::new(collection)),
        }
    }
}

#[async_trait]
impl TaskRepository for SharedTaskCollection {
    async fn create(&self, task: NewTask) -> Result<Task> {
        self.inner.write().await.create(task)
    }

    async fn get(&self, title: &str) -> Result<Task> {
        self.inner.read().await.get_by_title(title)
    }

    async fn update(&self, title: &str, patch: TaskPatch) -> Result<Task> {
        self.inner.write().await.update(title, patch)
    }

    async fn delete(&self, title: &str) -> Result<Task> {
        self.inner.write().await.delete(title)
    }

    async fn query(&self, query: &TaskQuery) -> Result<TaskPage> {
        self.inner.read().await.query(query)
    }

    async fn count(&self) -> usize {
        self.inner.read().await.len()
    }
}
