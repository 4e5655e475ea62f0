//! Mapping of core errors onto HTTP responses.

use api_shared::ErrorRes;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use filedrop_core::CoreError;

/// Every error a handler can return. Rendered as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Internal error")]
    Internal,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorRes {
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Validation(reason) => ApiError::BadRequest(reason),
            CoreError::NotFound(_) | CoreError::Orphaned(_) => ApiError::NotFound(e.to_string()),
            CoreError::Conflict(name) => {
                ApiError::Conflict(format!("Could not find a free name for {name}"))
            }
            other => {
                tracing::error!("Storage error: {:?}", other);
                ApiError::Internal
            }
        }
    }
}

impl From<minijinja::Error> for ApiError {
    fn from(e: minijinja::Error) -> Self {
        tracing::error!("Page render error: {:?}", e);
        ApiError::Internal
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        tracing::error!("Blocking task failed: {:?}", e);
        ApiError::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_status_codes() {
        let cases = [
            (CoreError::Validation("No selected file".into()), StatusCode::BAD_REQUEST),
            (CoreError::NotFound("a.txt".into()), StatusCode::NOT_FOUND),
            (CoreError::Orphaned("a.txt".into()), StatusCode::NOT_FOUND),
            (CoreError::Conflict("a.txt".into()), StatusCode::CONFLICT),
            (CoreError::Config("bad".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (core, status) in cases {
            assert_eq!(ApiError::from(core).status_code(), status);
        }
    }

    #[test]
    fn not_found_messages_distinguish_orphans() {
        assert_eq!(
            ApiError::from(CoreError::NotFound("a.txt".into())).to_string(),
            "File not found"
        );
        assert_eq!(
            ApiError::from(CoreError::Orphaned("a.txt".into())).to_string(),
            "File not found on disk"
        );
    }
}
