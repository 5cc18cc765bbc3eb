//! Replicator administration CLI.
//!
//! Small, DB-connecting operator commands that sit alongside the service
//! rather than inside it: inspecting the durable checkpoint, manually
//! triggering the version-mapping retention sweep, and dropping a target-doc
//! record administratively — an explicit escape hatch for a document the
//! operator has decided to stop tracking, without the side effect of
//! issuing a target-repository delete.

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use replicator_db::checkpoint::StateStore;
use replicator_db::target_index::TargetIndex;
use replicator_db::version_map::VersionMap;
use replicator_db::{create_pool, DatabaseConfig};
use replicator_domain::state::LogState;

#[derive(Parser)]
#[command(name = "replicator-cli")]
#[command(about = "Replicator administration CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect the durable log-following checkpoint
    Checkpoint {
        #[command(subcommand)]
        action: CheckpointCommands,
    },
    /// Manage the source-version -> target-version mapping table
    VersionMap {
        #[command(subcommand)]
        action: VersionMapCommands,
    },
    /// Manage target-document index rows directly
    TargetDoc {
        #[command(subcommand)]
        action: TargetDocCommands,
    },
}

#[derive(Subcommand)]
enum CheckpointCommands {
    /// Print the currently stored `(position, caught_up)` checkpoint
    Show,
}

#[derive(Subcommand)]
enum VersionMapCommands {
    /// Delete mapping rows older than the given number of days
    Prune {
        /// Retention window, in days. Defaults to the cleanup worker's own
        /// 180-day retention.
        #[arg(long, default_value_t = 180)]
        older_than_days: i64,
    },
}

#[derive(Subcommand)]
enum TargetDocCommands {
    /// Drop a document's target-index row and version mappings without
    /// issuing a target-repository delete. Use this when the target
    /// document has already been removed out of band and replication
    /// should simply stop tracking it.
    Forget {
        #[arg(long)]
        doc_uuid: Uuid,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    replicator_common::init_tracing();

    let cli = Cli::parse();
    let database = DatabaseConfig::from_env().context("loading DATABASE_URL")?;
    let pool = create_pool(&database).await.context("connecting to database")?;

    match cli.command {
        Commands::Checkpoint { action } => match action {
            CheckpointCommands::Show => {
                let checkpoint: Option<LogState> = StateStore::load(&pool, "log_state")
                    .await
                    .context("loading checkpoint")?;
                match checkpoint {
                    Some(state) => {
                        println!("position={} caught_up={}", state.position, state.caught_up);
                    }
                    None => println!("no checkpoint stored"),
                }
            }
        },
        Commands::VersionMap { action } => match action {
            VersionMapCommands::Prune { older_than_days } => {
                let cutoff = Utc::now() - chrono::Duration::days(older_than_days);
                let pruned = VersionMap::prune_older_than(&pool, cutoff)
                    .await
                    .context("pruning version mappings")?;
                println!("pruned {pruned} mapping row(s) older than {older_than_days} day(s)");
            }
        },
        Commands::TargetDoc { action } => match action {
            TargetDocCommands::Forget { doc_uuid } => {
                let mut tx = pool.begin().await.context("starting transaction")?;
                TargetIndex::delete(&mut *tx, doc_uuid)
                    .await
                    .context("deleting target-index row")?;
                VersionMap::delete_for_doc(&mut *tx, doc_uuid)
                    .await
                    .context("deleting version mappings")?;
                tx.commit().await.context("committing transaction")?;
                println!("forgot target document {doc_uuid}");
            }
        },
    }

    Ok(())
}
