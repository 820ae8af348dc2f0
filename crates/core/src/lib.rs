//! Core library for the Todo List API
//!
//! This crate contains the task collection engine:
//! - Task model and field validation
//! - The in-memory collection with create/read/update/delete
//! - The query pipeline (filter, search, sort, paginate)

pub mod error;
pub mod task;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
