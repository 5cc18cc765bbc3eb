//! Attachment transfer.
//!
//! Download from source, upload to target, and return the upload ids the
//! applier folds into `update.attach_objects`. Any transport failure here
//! is fatal for the event (no partial/fallback behavior).

use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use replicator_domain::update::CreateUploadRequest;
use replicator_repo_clients::{GetAttachmentsRequest, SourceRepositoryClient, TargetRepositoryClient};

use crate::config::AttachmentScopeConfig;
use crate::outcome::EngineError;

pub async fn transfer_attachments(
    source: &dyn SourceRepositoryClient,
    target: &dyn TargetRepositoryClient,
    scope: &AttachmentScopeConfig,
    doc_uuid: Uuid,
    doc_type: &str,
    attached_objects: &[String],
) -> Result<HashMap<String, String>, EngineError> {
    let mut uploads = HashMap::new();

    for name in attached_objects {
        if !scope.in_scope(name, doc_type) {
            debug!(%name, %doc_type, "attachment out of scope, skipping");
            continue;
        }

        let mut matches = source
            .get_attachments(GetAttachmentsRequest {
                name: Some(name.clone()),
                uuids: vec![doc_uuid],
                download_link: true,
            })
            .await?;

        let Some(attachment) = matches.pop() else {
            debug!(%name, %doc_uuid, "attachment missing at source, skipping");
            continue;
        };

        let bytes = source.download_attachment(&attachment.download_link).await?;

        let upload = target
            .create_upload(&CreateUploadRequest {
                name: attachment.filename.clone(),
                content_type: attachment.content_type.clone().unwrap_or_default(),
            })
            .await?;

        target
            .upload_attachment(&upload.url, attachment.content_type.as_deref(), bytes)
            .await?;

        uploads.insert(name.clone(), upload.id);
    }

    Ok(uploads)
}
