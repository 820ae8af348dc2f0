//! Field constraint checks run at every mutation entry point

use super::model::{NewTask, TaskPatch, DESCRIPTION_MAX_LEN, TITLE_MAX_LEN};
use crate::{Error, Result};

fn check_length(field: &'static str, value: &str, max: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(field, "must not be empty"));
    }
    let len = value.chars().count();
    if len > max {
        return Err(Error::validation(
            field,
            format!("must be at most {max} characters (got {len})"),
        ));
    }
    Ok(())
}

/// Validate a task title: 1 to 100 characters, not blank
pub(crate) fn validate_title(title: &str) -> Result<()> {
    check_length("title", title, TITLE_MAX_LEN)
}

/// Validate a task description: 1 to 1000 characters, not blank
pub(crate) fn validate_description(description: &str) -> Result<()> {
    check_length("description", description, DESCRIPTION_MAX_LEN)
}

// Status and priority are range-checked when their types are constructed.
pub(crate) fn validate_new_task(task: &NewTask) -> Result<()> {
    validate_title(&task.title)?;
    validate_description(&task.description)
}

pub(crate) fn validate_patch(patch: &TaskPatch) -> Result<()> {
    match &patch.description {
        Some(description) => validate_description(description),
        None => Ok(()),
    }
}
