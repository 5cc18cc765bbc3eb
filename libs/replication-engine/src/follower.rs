//! Log follower (external collaborator).
//!
//! The replicator consumes this trait; the concrete implementation that
//! wraps `SourceRepositoryClient::eventlog` with long-polling behavior is
//! an infrastructure concern and lives in `apps/replicator`. This crate
//! only depends on the trait, so the replication loop and applier can be
//! tested against a fake.

use async_trait::async_trait;

use replicator_domain::event::Event;
use replicator_repo_clients::RepositoryError;

/// Observable contract: `next` blocks up to a configured wait duration if
/// no new events exist, and returns them in ascending `id` order.
/// `caught_up` flips to `true` once the backlog has drained and never
/// flips back.
#[async_trait]
pub trait LogFollower: Send + Sync {
    /// Pulls the next batch (possibly empty if nothing new has arrived
    /// within the poll wait). Advances the follower's own cursor past
    /// whatever it returns.
    async fn next(&self) -> Result<Vec<Event>, RepositoryError>;

    /// The follower's current cursor — the last event id it has handed
    /// out (or the starting position if nothing has been pulled yet).
    /// The replication loop uses this to seed its local `pos` before the
    /// first batch, and to fall back on when a batch comes back empty.
    fn position(&self) -> i64;

    fn caught_up(&self) -> bool;
}
