//! Shared error taxonomy for both repository clients.
//!
//! Every method on [`crate::SourceRepositoryClient`]/
//! [`crate::TargetRepositoryClient`] returns this one type rather than a
//! per-method enum: the engine only ever distinguishes three outcomes — a
//! well-known "not found", a well-known "failed precondition" from
//! `Update`, and everything else, which is fatal.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The well-known "not found" response — the engine maps this to
    /// `skipped`.
    #[error("not found")]
    NotFound,

    /// The well-known "failed precondition" response from `Update` — the
    /// engine maps this to `conflict`.
    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    /// Transport failure, unexpected status code, or response that doesn't
    /// decode — the engine treats this as fatal.
    #[error("repository call failed: {0}")]
    Other(String),
}

impl RepositoryError {
    pub(crate) fn from_response_status(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            404 => Self::NotFound,
            409 | 412 => Self::FailedPrecondition(body),
            _ => Self::Other(format!("HTTP {status}: {body}")),
        }
    }
}
