//! Task repository: typed task operations over the [`RecordStore`].
//!
//! Each operation issues exactly one store statement on tokio's blocking
//! pool. Once handed to the pool the statement runs to completion even if
//! the caller stops waiting, so an aborted request never leaves a write
//! half-applied.
//!
//! Update and delete use a strict existence policy: a statement that touches
//! no row surfaces as [`TaskError::NotFound`].

use std::sync::Arc;

use tasklist_proto::task::{self, MAX_TITLE_LENGTH, Task, TaskId, TitleError};

use crate::store::{RecordStore, StoreError};

/// Errors surfaced by repository operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// Caller input failed validation.
    #[error("invalid task: {0}")]
    Validation(#[from] TitleError),

    /// No task with this id exists.
    #[error("task {0} not found")]
    NotFound(TaskId),

    /// The underlying store failed.
    #[error("store failure: {0}")]
    Store(#[from] StoreError),

    /// The blocking worker running the statement panicked.
    #[error("store worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Domain-level access to tasks. Cheap to clone; clones share the store.
#[derive(Debug, Clone)]
pub struct TaskRepository {
    store: Arc<RecordStore>,
    max_title_length: usize,
}

impl TaskRepository {
    /// Creates a repository with the default title length limit.
    #[must_use]
    pub const fn new(store: Arc<RecordStore>) -> Self {
        Self {
            store,
            max_title_length: MAX_TITLE_LENGTH,
        }
    }

    /// Overrides the maximum title length in characters.
    #[must_use]
    pub const fn with_max_title_length(mut self, max_title_length: usize) -> Self {
        self.max_title_length = max_title_length;
        self
    }

    /// Validates `title`, inserts it, and returns the stored task.
    ///
    /// # Errors
    ///
    /// [`TaskError::Validation`] for a blank or over-long title (no row is
    /// written), [`TaskError::Store`] if the insert fails.
    pub async fn create_task(&self, title: String) -> Result<Task, TaskError> {
        task::validate_title(&title, self.max_title_length)?;

        let id = {
            let title = title.clone();
            self.run(move |store| store.insert(&title)).await?
        };
        tracing::info!(task_id = id, "task created");

        Ok(Task {
            id,
            title,
            done: false,
        })
    }

    /// Lists all tasks in store order. Empty when there are none.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Store`] if the query fails.
    pub async fn list_tasks(&self) -> Result<Vec<Task>, TaskError> {
        let tasks = self.run(|store| store.select_all()).await?;
        tracing::debug!(count = tasks.len(), "tasks listed");
        Ok(tasks)
    }

    /// Sets the completion flag on one task.
    ///
    /// # Errors
    ///
    /// [`TaskError::NotFound`] if `id` names no task, [`TaskError::Store`] if
    /// the update fails.
    pub async fn set_task_done(&self, id: TaskId, done: bool) -> Result<(), TaskError> {
        let changed = self.run(move |store| store.update_status(id, done)).await?;
        if changed == 0 {
            return Err(TaskError::NotFound(id));
        }
        tracing::info!(task_id = id, done, "task status updated");
        Ok(())
    }

    /// Deletes one task. Irreversible; the id is never handed out again.
    ///
    /// # Errors
    ///
    /// [`TaskError::NotFound`] if `id` names no task, [`TaskError::Store`] if
    /// the delete fails.
    pub async fn delete_task(&self, id: TaskId) -> Result<(), TaskError> {
        let removed = self.run(move |store| store.delete(id)).await?;
        if removed == 0 {
            return Err(TaskError::NotFound(id));
        }
        tracing::info!(task_id = id, "task deleted");
        Ok(())
    }

    /// Runs one store call on the blocking pool.
    async fn run<T, F>(&self, op: F) -> Result<T, TaskError>
    where
        F: FnOnce(&RecordStore) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let result = tokio::task::spawn_blocking(move || op(store.as_ref())).await?;
        Ok(result?)
    }
}
