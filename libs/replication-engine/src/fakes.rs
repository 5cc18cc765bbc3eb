//! Hand-rolled in-memory fakes for the follower and repository traits,
//! test-only (cfg-gated from `lib.rs`): a `tokio::sync::Mutex` guarding a
//! plain collection, with no mocking framework involved.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use replicator_domain::document::{Document, DocumentMeta, StatusDocument};
use replicator_domain::event::Event;
use replicator_domain::update::{
    CreateUploadRequest, CreateUploadResult, DeleteRequest, UpdateRequest, UpdateResult,
};
use replicator_repo_clients::{
    AttachmentDownload, GetAttachmentsRequest, RepositoryError, SourceRepositoryClient,
    TargetRepositoryClient,
};

use crate::follower::LogFollower;

/// Replays a fixed, pre-loaded batch of events once, then reports
/// caught-up with empty batches thereafter.
#[derive(Default)]
pub struct FakeLogFollower {
    batches: Mutex<Vec<Vec<Event>>>,
    position: AtomicI64,
    caught_up: AtomicBool,
}

impl FakeLogFollower {
    #[must_use]
    pub fn new(batches: Vec<Vec<Event>>, start_caught_up: bool) -> Self {
        Self {
            batches: Mutex::new(batches),
            position: AtomicI64::new(0),
            caught_up: AtomicBool::new(start_caught_up),
        }
    }

    pub fn set_caught_up(&self, value: bool) {
        self.caught_up.store(value, Ordering::SeqCst);
    }
}

#[async_trait]
impl LogFollower for FakeLogFollower {
    async fn next(&self) -> Result<Vec<Event>, RepositoryError> {
        let mut batches = self.batches.lock().await;
        if batches.is_empty() {
            self.caught_up.store(true, Ordering::SeqCst);
            return Ok(vec![]);
        }
        let batch = batches.remove(0);
        if let Some(last) = batch.last() {
            self.position.store(last.id, Ordering::SeqCst);
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

/// In-memory source repository: documents/meta/status keyed by uuid,
/// attachment bytes keyed by download link.
#[derive(Default)]
pub struct FakeSourceRepositoryClient {
    pub meta: Mutex<HashMap<Uuid, DocumentMeta>>,
    pub documents: Mutex<HashMap<(Uuid, i64), Document>>,
    pub statuses: Mutex<HashMap<(Uuid, String, i64), StatusDocument>>,
    pub attachments: Mutex<HashMap<Uuid, Vec<AttachmentDownload>>>,
    pub attachment_bytes: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl SourceRepositoryClient for FakeSourceRepositoryClient {
    async fn eventlog(&self, _after: i64, _limit: usize) -> Result<Vec<Event>, RepositoryError> {
        Ok(vec![])
    }

    async fn get_meta(&self, uuid: Uuid) -> Result<DocumentMeta, RepositoryError> {
        self.meta
            .lock()
            .await
            .get(&uuid)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn get(&self, uuid: Uuid, version: i64) -> Result<Document, RepositoryError> {
        self.documents
            .lock()
            .await
            .get(&(uuid, version))
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_status(&self, uuid: Uuid, name: &str, id: i64) -> Result<StatusDocument, RepositoryError> {
        self.statuses
            .lock()
            .await
            .get(&(uuid, name.to_string(), id))
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_attachments(
        &self,
        req: GetAttachmentsRequest,
    ) -> Result<Vec<AttachmentDownload>, RepositoryError> {
        let Some(&uuid) = req.uuids.first() else {
            return Ok(vec![]);
        };
        let all = self.attachments.lock().await;
        let Some(entries) = all.get(&uuid) else {
            return Ok(vec![]);
        };
        Ok(entries
            .iter()
            .filter(|a| match req.name.as_deref() {
                Some(name) => name == a.filename,
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn download_attachment(&self, download_link: &str) -> Result<Vec<u8>, RepositoryError> {
        self.attachment_bytes
            .lock()
            .await
            .get(download_link)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }
}

/// In-memory target repository: tracks the current version per document
/// and rejects updates whose `if_match` does not equal it, the same
/// optimistic-concurrency contract the real HTTP target enforces.
#[derive(Default)]
pub struct FakeTargetRepositoryClient {
    pub versions: Mutex<HashMap<Uuid, i64>>,
    pub updates: Mutex<Vec<UpdateRequest>>,
    pub deletes: Mutex<Vec<Uuid>>,
    pub uploads: Mutex<Vec<(String, Vec<u8>)>>,
    next_upload_id: AtomicI64,
}

#[async_trait]
impl TargetRepositoryClient for FakeTargetRepositoryClient {
    async fn update(&self, req: &UpdateRequest) -> Result<UpdateResult, RepositoryError> {
        let mut versions = self.versions.lock().await;
        let current = versions.get(&req.uuid).copied();
        if current != req.if_match {
            return Err(RepositoryError::FailedPrecondition(format!(
                "if_match {:?} does not match current {:?}",
                req.if_match, current
            )));
        }
        let next_version = current.unwrap_or(0) + 1;
        versions.insert(req.uuid, next_version);
        self.updates.lock().await.push(req.clone());
        Ok(UpdateResult {
            version: next_version,
        })
    }

    async fn create_upload(
        &self,
        req: &CreateUploadRequest,
    ) -> Result<CreateUploadResult, RepositoryError> {
        let id = self.next_upload_id.fetch_add(1, Ordering::SeqCst);
        Ok(CreateUploadResult {
            id: id.to_string(),
            url: format!("https://target.example/uploads/{id}/{}", req.name),
        })
    }

    async fn delete(&self, req: &DeleteRequest) -> Result<(), RepositoryError> {
        self.versions.lock().await.remove(&req.uuid);
        self.deletes.lock().await.push(req.uuid);
        Ok(())
    }

    async fn upload_attachment(
        &self,
        url: &str,
        _content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<(), RepositoryError> {
        self.uploads.lock().await.push((url.to_string(), bytes));
        Ok(())
    }
}
