//! Version-map cleanup worker.
//!
//! Sleeps an hour between ticks; each tick prunes mapping rows older than
//! the retention horizon directly against the pool, with no transaction —
//! a single best-effort DELETE is safe to run concurrently with the
//! applier's own transactions against the same table.

use chrono::{Duration as ChronoDuration, Utc};
use sqlx::PgPool;
use tokio::time::{self, Duration};
use tokio_util::sync::CancellationToken;
use tracing::info;

use replicator_db::version_map::VersionMap;

use crate::outcome::EngineError;

const TICK_INTERVAL: Duration = Duration::from_secs(3600);
const RETENTION: ChronoDuration = ChronoDuration::days(180);

/// Runs until `stop` is cancelled.
pub async fn run_cleanup_worker(pool: PgPool, stop: CancellationToken) -> Result<(), EngineError> {
    loop {
        tokio::select! {
            biased;
            () = stop.cancelled() => {
                info!("cleanup worker stopping");
                return Ok(());
            }
            () = time::sleep(TICK_INTERVAL) => {}
        }

        let cutoff = Utc::now() - RETENTION;
        let pruned = VersionMap::prune_older_than(&pool, cutoff).await?;
        if pruned > 0 {
            info!(pruned, "pruned aged version-mapping rows");
        }
    }
}
