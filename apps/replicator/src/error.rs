//! RPC-surface error handling: status code + machine-readable error tag +
//! message, the same shape used across this stack's other HTTP surfaces.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("authentication token missing or malformed")]
    Unauthorized,

    #[error("token does not carry a required scope")]
    Forbidden,

    #[error("not implemented")]
    Unimplemented,

    #[error("internal error")]
    Internal,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let (status, tag) = match &self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            Self::Unimplemented => (StatusCode::NOT_IMPLEMENTED, "unimplemented"),
            Self::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };
        (
            status,
            Json(ErrorBody {
                error: tag.to_string(),
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}
