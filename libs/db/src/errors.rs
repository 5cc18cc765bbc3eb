//! Shared persistence error type.
//!
//! Unlike a per-operation error enum (one `thiserror` variant set per
//! repository method), the four tables here have no business-specific
//! failure modes beyond "the database said no" or "the stored JSON didn't
//! decode" — so a single shared type is used across `checkpoint`,
//! `target_index`, and `version_map`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error")]
    Database(#[from] sqlx::Error),
    #[error("failed to encode/decode stored value")]
    Codec(#[from] serde_json::Error),
}
