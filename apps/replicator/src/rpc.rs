//! RPC surface: the `Replication.SendDocument` stub plus ambient
//! `/healthz`/`/readyz` routes every long-running service in this stack
//! exposes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use sqlx::PgPool;

use replicator_auth::JwtValidator;

use crate::error::RpcError;

#[derive(Clone)]
pub struct RpcState {
    pub pool: PgPool,
    pub jwt: Arc<JwtValidator>,
}

pub fn router(state: RpcState) -> Router {
    Router::new()
        .route("/rpc/Replication/SendDocument", post(send_document))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn readyz(State(state): State<RpcState>) -> Result<&'static str, RpcError> {
    sqlx::query("SELECT 1")
        .execute(&state.pool)
        .await
        .map_err(|_| RpcError::Internal)?;
    Ok("ok")
}

/// Enforces the `doc_admin`/`doc_write` scope requirement, then returns
/// `Unimplemented` — this path accepts pushed documents from the source
/// side rather than pulling from the event log, which this service does
/// not yet do.
async fn send_document(
    State(state): State<RpcState>,
    headers: axum::http::HeaderMap,
) -> Result<Json<Value>, RpcError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(RpcError::Unauthorized)?;

    let claims = state
        .jwt
        .validate(token)
        .await
        .map_err(|_| RpcError::Unauthorized)?;

    if !claims.has_any_scope(&["doc_admin", "doc_write"]) {
        return Err(RpcError::Forbidden);
    }

    Err(RpcError::Unimplemented)
}
