//! Replicator — process entry point.
//!
//! Wires the Postgres pool, the source/target repository clients, and the
//! replication engine, then runs three tasks under one shutdown
//! controller: the replication loop, the cleanup worker, and the RPC
//! server. "stop" drains the first two; "quit" additionally tears down
//! the server's listener.

mod config;
mod error;
mod follower;
mod rpc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use replicator_auth::{JwtValidator, TokenProviders};
use replicator_db::checkpoint::StateStore;
use replicator_domain::state::LogState;
use replicator_engine::{run_cleanup_worker, run_replication_loop, EventApplier, LogFollower};
use replicator_repo_clients::{
    HttpSourceRepositoryClient, HttpTargetRepositoryClient, SourceRepositoryClient, TargetRepositoryClient,
};

use config::Config;
use follower::HttpLogFollower;

/// Grace period given to the replication loop, cleanup worker, and server
/// to drain after cancellation before the process exits regardless.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    replicator_common::init_tracing();

    let config = Config::from_env().context("loading configuration")?;
    let pool = replicator_db::create_pool(&config.database)
        .await
        .context("connecting to database")?;

    let tokens = TokenProviders::from_configs(config.source_oidc.clone(), config.target_oidc.clone())
        .context("constructing client-credentials token providers")?;

    let source: Arc<dyn SourceRepositoryClient> = Arc::new(HttpSourceRepositoryClient::new(
        config.source_base_url.clone(),
        tokens.source.clone(),
    ));
    let target: Arc<dyn TargetRepositoryClient> = Arc::new(HttpTargetRepositoryClient::new(
        config.target_base_url.clone(),
        tokens.target.clone(),
    ));

    let checkpoint: Option<LogState> = StateStore::load(&pool, "log_state")
        .await
        .context("loading checkpoint")?;
    let start_position = checkpoint
        .map(|state| state.position)
        .unwrap_or(0)
        .max(config.start_event);

    let follower: Arc<dyn LogFollower> = Arc::new(HttpLogFollower::new(
        source.clone(),
        start_position,
        config.batch_size,
    ));

    let applier = Arc::new(EventApplier::new(
        pool.clone(),
        source,
        target,
        config.filter,
        config.ignore,
        config.attachment_scope,
    ));

    let jwt = Arc::new(JwtValidator::new(config.jwt));

    let stop = CancellationToken::new();
    let quit = CancellationToken::new();

    let mut replication_task = tokio::spawn(run_replication_loop(
        pool.clone(),
        follower,
        applier,
        stop.clone(),
    ));
    let mut cleanup_task = tokio::spawn(run_cleanup_worker(pool.clone(), stop.clone()));

    let rpc_state = rpc::RpcState { pool: pool.clone(), jwt };
    let app = rpc::router(rpc_state).layer(tower_http::trace::TraceLayer::new_for_http());
    let listener = tokio::net::TcpListener::bind(config.rpc_addr)
        .await
        .context("binding RPC listener")?;
    tracing::info!(addr = %config.rpc_addr, "RPC server listening");

    let quit_signal = quit.clone();
    let mut server_task = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { quit_signal.cancelled().await })
            .await
    });

    let exit_code = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
            0
        }
        res = &mut replication_task => {
            tracing::error!(?res, "replication loop terminated unexpectedly");
            1
        }
        res = &mut cleanup_task => {
            tracing::error!(?res, "cleanup worker terminated unexpectedly");
            1
        }
        res = &mut server_task => {
            tracing::error!(?res, "rpc server terminated unexpectedly");
            1
        }
    };

    stop.cancel();
    quit.cancel();
    tokio::time::sleep(SHUTDOWN_GRACE).await;

    if exit_code != 0 {
        anyhow::bail!("a background task terminated with an error, see log for details");
    }
    Ok(())
}
