//! Repository trait definitions.
//!
//! Trait-per-concern, `async_trait`, one `Result<_, RepositoryError>` per
//! method — the same shape this stack's Postgres repositories use,
//! applied here to an HTTP-backed external dependency instead.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use replicator_domain::document::{DocumentMeta, StatusDocument};
use replicator_domain::event::Event;
use replicator_domain::update::{CreateUploadRequest, CreateUploadResult, DeleteRequest, UpdateRequest, UpdateResult};

use crate::error::RepositoryError;

/// A single entry from [`SourceRepositoryClient::get_attachments`].
#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentDownload {
    pub filename: String,
    pub content_type: Option<String>,
    pub download_link: String,
}

/// Selects which attachments to fetch metadata for via `GetAttachments`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GetAttachmentsRequest {
    pub name: Option<String>,
    pub uuids: Vec<Uuid>,
    /// Whether the source should include a signed `download_link` on each
    /// returned entry. The attachment transfer step always needs this, so
    /// it always sets this `true`.
    pub download_link: bool,
}

#[async_trait]
pub trait SourceRepositoryClient: Send + Sync {
    /// Fetches up to `limit` events with `id > after`, in ascending order.
    /// An empty result means the follower has caught up to the head of the
    /// log for now.
    async fn eventlog(&self, after: i64, limit: usize) -> Result<Vec<Event>, RepositoryError>;

    async fn get_meta(&self, uuid: Uuid) -> Result<DocumentMeta, RepositoryError>;

    async fn get(
        &self,
        uuid: Uuid,
        version: i64,
    ) -> Result<replicator_domain::document::Document, RepositoryError>;

    async fn get_status(
        &self,
        uuid: Uuid,
        name: &str,
        id: i64,
    ) -> Result<StatusDocument, RepositoryError>;

    async fn get_attachments(
        &self,
        req: GetAttachmentsRequest,
    ) -> Result<Vec<AttachmentDownload>, RepositoryError>;

    /// Downloads attachment bytes from a `download_link` returned by
    /// `get_attachments`.
    async fn download_attachment(&self, download_link: &str) -> Result<Vec<u8>, RepositoryError>;
}

#[async_trait]
pub trait TargetRepositoryClient: Send + Sync {
    async fn update(&self, req: &UpdateRequest) -> Result<UpdateResult, RepositoryError>;

    async fn create_upload(
        &self,
        req: &CreateUploadRequest,
    ) -> Result<CreateUploadResult, RepositoryError>;

    async fn delete(&self, req: &DeleteRequest) -> Result<(), RepositoryError>;

    /// Uploads attachment bytes to the `url` returned by `create_upload`.
    async fn upload_attachment(
        &self,
        url: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<(), RepositoryError>;
}
