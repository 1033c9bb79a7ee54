//! Task record and request/response bodies for the `/api/tasks` resource.
//!
//! Request bodies are decoded strictly: every field is required and unknown
//! fields are rejected, so a typo such as `{"titel": "x"}` is a client error
//! rather than a silently defaulted value.

use serde::{Deserialize, Serialize};

/// Default maximum allowed task title length in characters.
pub const MAX_TITLE_LENGTH: usize = 256;

/// Store-assigned task identifier. Always positive.
pub type TaskId = i64;

/// A persisted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier assigned by the store on creation.
    pub id: TaskId,
    /// Title as supplied at creation; never changes afterwards.
    pub title: String,
    /// Completion flag, `false` on creation.
    pub done: bool,
}

/// Body of `POST /api/tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTaskRequest {
    pub title: String,
}

/// Response to a successful `POST /api/tasks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTaskResponse {
    pub id: TaskId,
}

/// Body of `PUT /api/tasks/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetDoneRequest {
    pub done: bool,
}

/// JSON body returned with every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Reasons a task title is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TitleError {
    /// Title is empty or whitespace only.
    #[error("task title must not be empty")]
    Empty,
    /// Title exceeds the configured character limit.
    #[error("task title is {len} characters (max {max})")]
    TooLong {
        /// Character count of the rejected title.
        len: usize,
        /// Limit in effect.
        max: usize,
    },
}

/// Reasons a `{id}` path segment is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskIdError {
    #[error("task id is empty")]
    Empty,
    #[error("task id {0:?} is not a decimal integer")]
    NotDecimal(String),
    #[error("task id {0:?} is out of range")]
    OutOfRange(String),
}

/// Checks a title against the creation rules.
///
/// Whitespace is trimmed only for the emptiness check; the stored title keeps
/// whatever the client sent. Length is counted in characters, not bytes.
///
/// # Errors
///
/// Returns [`TitleError::Empty`] for blank titles and [`TitleError::TooLong`]
/// when `title` has more than `max_chars` characters.
pub fn validate_title(title: &str, max_chars: usize) -> Result<(), TitleError> {
    if title.trim().is_empty() {
        return Err(TitleError::Empty);
    }
    let len = title.chars().count();
    if len > max_chars {
        return Err(TitleError::TooLong {
            len,
            max: max_chars,
        });
    }
    Ok(())
}

/// Parses a `{id}` path segment into a [`TaskId`].
///
/// Only a plain run of ASCII digits naming a positive `i64` is accepted:
/// no sign, no surrounding whitespace, no leading `+`, and never zero.
///
/// # Errors
///
/// Returns [`TaskIdError`] describing why the segment was rejected.
pub fn parse_task_id(segment: &str) -> Result<TaskId, TaskIdError> {
    if segment.is_empty() {
        return Err(TaskIdError::Empty);
    }
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TaskIdError::NotDecimal(segment.to_string()));
    }
    match segment.parse::<TaskId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(TaskIdError::OutOfRange(segment.to_string())),
    }
}
