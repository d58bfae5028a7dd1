//! Request validation.
//!
//! Every mutating operation goes through one of these functions before the
//! store is touched, so a rejected request never leaves a partial write.

use crate::error::{BoardError, Result};
use crate::types::{ActionChanges, ActionInput, NewAction, ProjectFields, ProjectInput};

/// Maximum length, in characters, of a project name or action description.
pub const MAX_TEXT_LEN: usize = 128;

fn required(value: Option<String>, field: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(BoardError::Validation(format!("{field} is required"))),
    }
}

fn bounded(value: String, field: &str) -> Result<String> {
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(BoardError::Validation(format!(
            "{field} must be at most {MAX_TEXT_LEN} characters"
        )));
    }
    Ok(value)
}

fn required_id(value: Option<i64>, field: &str) -> Result<i64> {
    value.ok_or_else(|| BoardError::Validation(format!("{field} is required")))
}

/// Validate a project body. Used for both create and full-replace update.
pub fn project_fields(input: ProjectInput) -> Result<ProjectFields> {
    let name = required(input.name, "name")?;
    let description = required(input.description, "description")?;
    Ok(ProjectFields {
        name: bounded(name, "name")?,
        description,
        completed: input.completed,
    })
}

pub fn new_action(input: ActionInput) -> Result<NewAction> {
    let project_id = required_id(input.project_id, "project_id")?;
    let description = required(input.description, "description")?;
    let notes = required(input.notes, "notes")?;
    Ok(NewAction {
        project_id,
        description: bounded(description, "description")?,
        notes,
        completed: input.completed.unwrap_or(false),
    })
}

pub fn action_changes(input: ActionInput) -> Result<ActionChanges> {
    let project_id = required_id(input.project_id, "project_id")?;
    let description = required(input.description, "description")?;
    Ok(ActionChanges {
        project_id,
        description: bounded(description, "description")?,
        notes: input.notes,
        completed: input.completed,
    })
}
