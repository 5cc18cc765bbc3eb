//! Concrete `LogFollower` over `SourceRepositoryClient::eventlog`. The
//! engine crate only depends on the trait so it can be tested against a
//! fake; this binary supplies the real long-polling implementation.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use replicator_domain::event::Event;
use replicator_engine::LogFollower;
use replicator_repo_clients::{RepositoryError, SourceRepositoryClient};

/// Blocks up to this long when a poll comes back empty before the caller
/// retries, so an idle source doesn't turn into a tight poll loop.
const POLL_WAIT: Duration = Duration::from_secs(10);

pub struct HttpLogFollower {
    source: Arc<dyn SourceRepositoryClient>,
    batch_size: usize,
    position: AtomicI64,
    caught_up: AtomicBool,
}

impl HttpLogFollower {
    #[must_use]
    pub fn new(source: Arc<dyn SourceRepositoryClient>, start_position: i64, batch_size: usize) -> Self {
        Self {
            source,
            batch_size,
            position: AtomicI64::new(start_position),
            caught_up: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl LogFollower for HttpLogFollower {
    async fn next(&self) -> Result<Vec<Event>, RepositoryError> {
        let after = self.position.load(Ordering::SeqCst);
        let batch = self.source.eventlog(after, self.batch_size).await?;

        if batch.is_empty() {
            // Backlog drained; the regime flips to live and never flips
            // back.
            self.caught_up.store(true, Ordering::SeqCst);
            debug!(after, "eventlog poll empty, waiting before retry");
            tokio::time::sleep(POLL_WAIT).await;
            return Ok(batch);
        }

        if let Some(last) = batch.last() {
            self.position.store(last.id, Ordering::SeqCst);
        }
        if batch.len() < self.batch_size {
            self.caught_up.store(true, Ordering::SeqCst);
        }

        Ok(batch)
    }

    fn position(&self) -> i64 {
        self.position.load(Ordering::SeqCst)
    }

    fn caught_up(&self) -> bool {
        self.caught_up.load(Ordering::SeqCst)
    }
}
