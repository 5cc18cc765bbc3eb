//! Batch driver.
//!
//! Pulls a batch from the follower, hands each event to the applier in
//! order, and writes a post-batch checkpoint only for the tail of skipped
//! (or conflicted) events the applier's own in-transaction checkpoint
//! never covered.

use std::sync::Arc;

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use replicator_db::checkpoint::StateStore;
use replicator_domain::state::LogState;

use crate::applier::EventApplier;
use crate::follower::LogFollower;
use crate::outcome::{ApplyOutcome, EngineError};

/// Runs until `stop` is cancelled or the applier reports a fatal error.
pub async fn run_replication_loop(
    pool: PgPool,
    follower: Arc<dyn LogFollower>,
    applier: Arc<EventApplier>,
    stop: CancellationToken,
) -> Result<(), EngineError> {
    let mut pos = follower.position();

    loop {
        let batch = tokio::select! {
            biased;
            () = stop.cancelled() => {
                info!("replication loop stopping");
                return Ok(());
            }
            result = follower.next() => result?,
        };

        if batch.is_empty() {
            continue;
        }

        let caught_up = follower.caught_up();
        let mut last_saved = pos;

        for event in &batch {
            let outcome = applier.handle_event(event, caught_up).await?;
            pos = event.id;

            match outcome {
                ApplyOutcome::Applied => {
                    last_saved = pos;
                }
                ApplyOutcome::Skipped { reason } => {
                    info!(event_id = event.id, doc_uuid = %event.uuid, reason, "event skipped");
                }
                ApplyOutcome::Conflict { reason } => {
                    warn!(event_id = event.id, doc_uuid = %event.uuid, reason, "event conflicted, target allowed to diverge");
                }
            }
        }

        if pos != last_saved {
            StateStore::store(
                &pool,
                "log_state",
                &LogState {
                    position: pos,
                    caught_up,
                },
            )
            .await?;
        }
    }
}
