//! Process-level configuration.
//!
//! Aggregates every `Config::from_env` in the stack into the one shape
//! `main.rs` needs to wire up the pool, the repository clients, and the
//! engine.

use replicator_auth::{ClientCredentialsConfig, ConfigError, JwtValidatorConfig};
use replicator_common::env::{comma_separated, flag, optional_parsed, required};
use replicator_db::DatabaseConfig;
use replicator_engine::{AttachmentScopeConfig, ContentFilter, FilterConfigError, IgnoreConfig};

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error(transparent)]
    Env(#[from] replicator_common::env::EnvError),
    #[error(transparent)]
    Auth(#[from] ConfigError),
    #[error(transparent)]
    Filter(#[from] FilterConfigError),
}

pub struct Config {
    pub database: DatabaseConfig,
    pub source_oidc: ClientCredentialsConfig,
    pub target_oidc: ClientCredentialsConfig,
    pub jwt: JwtValidatorConfig,
    pub source_base_url: String,
    pub target_base_url: String,
    /// Smallest event id to ever consider. The effective starting position
    /// is `max(checkpoint.position, start_event)` — a floor, never a
    /// ceiling, so it can't rewind a follower that is already further
    /// along (see DESIGN.md for the resolved open question on this).
    pub start_event: i64,
    pub batch_size: usize,
    pub ignore: IgnoreConfig,
    pub filter: ContentFilter,
    pub attachment_scope: AttachmentScopeConfig,
    pub rpc_addr: std::net::SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let ignore = IgnoreConfig::new(
            comma_separated("IGNORE_TYPES"),
            comma_separated("IGNORE_SUBS"),
        );
        let filter = ContentFilter::parse(&comma_separated("CONTENT_FILTER"))?;
        let attachment_scope = AttachmentScopeConfig::new(
            flag("ALL_ATTACHMENTS"),
            AttachmentScopeConfig::parse_include_entries(&comma_separated("INCLUDE_ATTACHMENTS")),
        );

        Ok(Self {
            database: DatabaseConfig::from_env()?,
            source_oidc: ClientCredentialsConfig::from_env("")?,
            target_oidc: ClientCredentialsConfig::from_env("TARGET_")?,
            jwt: JwtValidatorConfig::from_env()?,
            source_base_url: required("REPOSITORY_ENDPOINT")?,
            target_base_url: required("TARGET_REPOSITORY_ENDPOINT")?,
            start_event: optional_parsed("START_EVENT", 0)?,
            batch_size: optional_parsed("BATCH_SIZE", 100)?,
            ignore,
            filter,
            attachment_scope,
            rpc_addr: optional_parsed("ADDR", ([0, 0, 0, 0], 8080).into())?,
        })
    }
}
