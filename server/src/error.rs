use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use differing_core::RepoError;
use serde::Serialize;

/// JSON error body: `{"error": "...", "detail": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Any failure a handler can return.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.into(),
                detail: None,
            },
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.body.detail = Some(detail.into());
        self
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "not found")
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn body(&self) -> &ErrorBody {
        &self.body
    }
}

#[must_use]
pub fn status_for(err: &RepoError) -> StatusCode {
    match err {
        RepoError::InvalidPath { .. } | RepoError::InvalidDiffId(_) | RepoError::EmptyMessage => {
            StatusCode::BAD_REQUEST
        }
        RepoError::NotTracked { .. } | RepoError::NotHead { .. } => StatusCode::FORBIDDEN,
        RepoError::UnknownRevision { .. } => StatusCode::NOT_FOUND,
        RepoError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        RepoError::GitTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        RepoError::GitCommand { .. } | RepoError::NotARepository { .. } | RepoError::Io { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        let status = status_for(&err);
        // The git headline leaves stderr to `detail` rather than repeating it.
        let error = match &err {
            RepoError::GitCommand { command, .. } => format!("git {command} failed"),
            RepoError::InvalidPath { path, .. } => format!("invalid file path: {path:?}"),
            other => other.to_string(),
        };
        Self {
            status,
            body: ErrorBody {
                error,
                detail: err.detail(),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            StatusCode::PAYLOAD_TOO_LARGE
        } else {
            StatusCode::BAD_REQUEST
        };
        Self::new(status, "invalid request body").with_detail(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid request path")
            .with_detail(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                status = self.status.as_u16(),
                error = %self.body.error,
                detail = self.body.detail.as_deref().unwrap_or(""),
                "request failed"
            );
        } else {
            tracing::debug!(
                status = self.status.as_u16(),
                error = %self.body.error,
                "request rejected"
            );
        }
        (self.status, Json(self.body)).into_response()
    }
}
