//! HTTP resource layer: maps `/api/tasks` requests onto the
//! [`TaskRepository`] and repository errors onto status codes.
//!
//! | route                    | success            | errors            |
//! |--------------------------|--------------------|-------------------|
//! | `GET /api/tasks`         | 200, `[Task]`      | 500               |
//! | `POST /api/tasks`        | 201, `{"id": n}`   | 400, 413, 500     |
//! | `PUT /api/tasks/{id}`    | 200, empty         | 400, 404, 413, 500|
//! | `DELETE /api/tasks/{id}` | 200, empty         | 400, 404, 500     |
//!
//! Every error response carries an [`ErrorBody`]. Storage failures are
//! logged in full and reported to the client only as a generic message.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use tasklist_proto::task::{
    self, CreateTaskRequest, CreateTaskResponse, ErrorBody, SetDoneRequest, Task, TaskIdError,
};

use crate::auth::{self, AccessGate};
use crate::repository::{TaskError, TaskRepository};

/// Default maximum accepted request body size in bytes (16 KB).
const DEFAULT_MAX_BODY_SIZE: usize = 16 * 1024;

/// Shared state handed to every handler.
#[derive(Debug)]
pub struct ApiState {
    /// Task operations.
    pub tasks: TaskRepository,
    /// Credential check applied to every task route.
    pub access: AccessGate,
    max_body_size: usize,
}

impl ApiState {
    /// Creates state with open access and the default body size limit.
    #[must_use]
    pub fn new(tasks: TaskRepository) -> Self {
        Self {
            tasks,
            access: AccessGate::Open,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Replaces the access gate.
    #[must_use]
    pub fn with_access(mut self, access: AccessGate) -> Self {
        self.access = access;
        self
    }

    /// Sets the maximum accepted request body size in bytes.
    #[must_use]
    pub const fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }
}

/// Client-visible failure of an API request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed id, malformed body, or invalid field value.
    #[error("{0}")]
    BadRequest(String),
    #[error("task not found")]
    NotFound,
    #[error("request body too large")]
    PayloadTooLarge,
    #[error("unauthorized")]
    Unauthorized,
    /// Storage failure; details are logged, never returned.
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::Validation(e) => Self::BadRequest(e.to_string()),
            TaskError::NotFound(_) => Self::NotFound,
            TaskError::Store(_) | TaskError::Worker(_) => {
                tracing::error!(error = %err, "task store operation failed");
                Self::Internal
            }
        }
    }
}

impl From<TaskIdError> for ApiError {
    fn from(err: TaskIdError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

const MALFORMED_BODY: &str = "malformed request body";
const MALFORMED_ID: &str = "malformed task id";

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            tracing::debug!(reason = %rejection.body_text(), "request body rejected");
            Self::BadRequest(MALFORMED_BODY.into())
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "request path rejected");
        Self::BadRequest(MALFORMED_ID.into())
    }
}

/// Builds the task API router over `state`.
#[must_use]
pub fn router(state: Arc<ApiState>) -> axum::Router {
    let max_body_size = state.max_body_size;
    axum::Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/{id}", put(set_task_done).delete(delete_task))
        .route_layer(axum::middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::require_access,
        ))
        .layer(DefaultBodyLimit::max(max_body_size))
        .with_state(state)
}

/// `GET /api/tasks`
async fn list_tasks(State(state): State<Arc<ApiState>>) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(state.tasks.list_tasks().await?))
}

/// `POST /api/tasks`
async fn create_task(
    State(state): State<Arc<ApiState>>,
    body: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateTaskResponse>), ApiError> {
    let Json(request) = body?;
    let task = state.tasks.create_task(request.title).await?;
    Ok((StatusCode::CREATED, Json(CreateTaskResponse { id: task.id })))
}

/// `PUT /api/tasks/{id}`
async fn set_task_done(
    State(state): State<Arc<ApiState>>,
    segment: Result<Path<String>, PathRejection>,
    body: Result<Json<SetDoneRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(segment) = segment?;
    let id = task::parse_task_id(&segment)?;
    let Json(request) = body?;
    state.tasks.set_task_done(id, request.done).await?;
    Ok(StatusCode::OK)
}

/// `DELETE /api/tasks/{id}`
async fn delete_task(
    State(state): State<Arc<ApiState>>,
    segment: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(segment) = segment?;
    let id = task::parse_task_id(&segment)?;
    state.tasks.delete_task(id).await?;
    Ok(StatusCode::OK)
}

/// Starts the task API on the given address and returns the bound address
/// and a join handle.
///
/// Binding `127.0.0.1:0` picks a free port, which is how tests use it.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
    state: Arc<ApiState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "task server error");
        }
    });

    Ok((bound_addr, handle))
}
