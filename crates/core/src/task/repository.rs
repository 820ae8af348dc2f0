//! Task repository trait
//!
//! Defines the interface request handlers use to reach the task collection.

use async_trait::async_trait;

use super::model::{NewTask, Task, TaskPatch};
use super::query::{TaskPage, TaskQuery};
use crate::Result;

/// Repository interface for task operations, addressed by title
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Create a new task
    async fn create(&self, task: NewTask) -> Result<Task>;

    /// Get a task by title
    async fn get(&self, title: &str) -> Result<Task>;

    /// Update description, status and/or priority of a task
    async fn update(&self, title: &str, patch: TaskPatch) -> Result<Task>;

    /// Delete a task by title, returning the removed task
    async fn delete(&self, title: &str) -> Result<Task>;

    /// Filter, search, sort and paginate
    async fn query(&self, query: &TaskQuery) -> Result<TaskPage>;

    /// Number of stored tasks
    async fn count(&self) -> usize;
}
