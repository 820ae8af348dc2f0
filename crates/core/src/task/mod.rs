//! Task module
//!
//! This module contains task-related types and logic.

mod collection;
mod cursor;
mod model;
mod query;
mod repository;
mod shared;
mod validate;

pub use collection::TaskCollection;
pub use model::*;
pub use query::*;
pub use repository::TaskRepository;
pub use shared::SharedTaskCollection;
