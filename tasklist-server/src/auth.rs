//! Optional bearer-token gate in front of the task API.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::{ApiError, ApiState};

/// Decides whether a request may reach the task routes.
#[derive(Clone, Default)]
pub enum AccessGate {
    /// Every request is admitted.
    #[default]
    Open,
    /// Only requests carrying `Authorization: Bearer <token>` are admitted.
    BearerToken(String),
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => f.write_str("Open"),
            Self::BearerToken(_) => f.write_str("BearerToken(..)"),
        }
    }
}

impl AccessGate {
    /// Builds a gate from the configured token; `None` means open access.
    #[must_use]
    pub fn from_token(token: Option<String>) -> Self {
        token.map_or(Self::Open, Self::BearerToken)
    }

    /// Returns `true` when this gate demands credentials.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        matches!(self, Self::BearerToken(_))
    }

    /// Checks the raw `Authorization` header value.
    #[must_use]
    pub fn admits(&self, authorization: Option<&str>) -> bool {
        match self {
            Self::Open => true,
            Self::BearerToken(expected) => authorization
                .and_then(|value| value.strip_prefix("Bearer "))
                .is_some_and(|presented| constant_time_eq(presented.as_bytes(), expected.as_bytes())),
        }
    }
}

/// Compares two byte strings without stopping at the first mismatch.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// axum middleware rejecting requests the [`AccessGate`] does not admit.
pub async fn require_access(
    State(state): State<Arc<ApiState>>,
    request: Request,
    next: Next,
) -> Response {
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    if !state.access.admits(authorization) {
        tracing::warn!(
            method = %request.method(),
            uri = %request.uri(),
            "rejected request without valid credentials"
        );
        return ApiError::Unauthorized.into_response();
    }

    next.run(request).await
}
