//! PostgreSQL persistence for the replicator: connection pooling,
//! checkpoint storage, and the target-document / version-mapping tables.

pub mod checkpoint;
pub mod errors;
pub mod pool;
pub mod target_index;
pub mod version_map;

pub use checkpoint::StateStore;
pub use errors::DbError;
pub use pool::{create_pool, DatabaseConfig, DatabaseError};
pub use target_index::TargetIndex;
pub use version_map::VersionMap;
