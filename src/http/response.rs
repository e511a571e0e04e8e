//! Mapping of update failures to HTTP responses.
//!
//! | failure | status |
//! |---|---|
//! | malformed request, bad upload name | 400 |
//! | body over `security.max_body_size` | 413 |
//! | ini unreadable or unwritable | 500 |
//! | reload could not run or was not confirmed | 502 |
//! | reload timed out | 504 |
//! | update worker gone | 503 |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::editor::{EditorError, UpdateError};
use crate::reload::ReloadError;

/// Error returned by the update handler.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error(transparent)]
    Update(#[from] UpdateError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Update(UpdateError::Editor(EditorError::InvalidUploadName(_))) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Update(UpdateError::Editor(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Update(UpdateError::Reload(ReloadError::Timeout(_))) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            ApiError::Update(UpdateError::Reload(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Update(UpdateError::WorkerClosed) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
