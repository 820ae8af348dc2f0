//! Error types for the core library

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Task with title '{0}' already exists")]
    DuplicateTitle(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
}

impl Error {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}
