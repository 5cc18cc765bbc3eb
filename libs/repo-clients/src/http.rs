//! HTTP implementations of the repository client traits.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use replicator_auth::ClientCredentialsTokenProvider;
use replicator_domain::document::{Document, DocumentMeta, StatusDocument};
use replicator_domain::event::Event;
use replicator_domain::update::{CreateUploadRequest, CreateUploadResult, DeleteRequest, UpdateRequest, UpdateResult};

use crate::error::RepositoryError;
use crate::traits::{AttachmentDownload, GetAttachmentsRequest, SourceRepositoryClient, TargetRepositoryClient};

async fn send_json<T: serde::Serialize + Sync>(
    http: &Client,
    token: &str,
    method: reqwest::Method,
    url: &str,
    body: Option<&T>,
) -> Result<reqwest::Response, RepositoryError> {
    let mut builder = http.request(method, url).bearer_auth(token);
    if let Some(body) = body {
        builder = builder.json(body);
    }
    builder
        .send()
        .await
        .map_err(|e| RepositoryError::Other(format!("request failed: {e}")))
}

async fn decode<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, RepositoryError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(RepositoryError::from_response_status(status, body));
    }
    response
        .json()
        .await
        .map_err(|e| RepositoryError::Other(format!("invalid response body: {e}")))
}

/// HTTP client for the source repository (`Eventlog`, `GetMeta`, `Get`,
/// `GetStatus`, `GetAttachments`).
pub struct HttpSourceRepositoryClient {
    http: Client,
    base_url: String,
    tokens: Arc<ClientCredentialsTokenProvider>,
}

impl HttpSourceRepositoryClient {
    pub fn new(base_url: impl Into<String>, tokens: Arc<ClientCredentialsTokenProvider>) -> Self {
        Self {
            http: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("reqwest client construction cannot fail with no custom TLS config"),
            base_url: base_url.into(),
            tokens,
        }
    }

    async fn token(&self) -> Result<String, RepositoryError> {
        self.tokens
            .token()
            .await
            .map_err(|e| RepositoryError::Other(format!("token fetch failed: {e}")))
    }
}

#[async_trait]
impl SourceRepositoryClient for HttpSourceRepositoryClient {
    async fn eventlog(&self, after: i64, limit: usize) -> Result<Vec<Event>, RepositoryError> {
        let token = self.token().await?;
        let url = format!("{}/eventlog?after={after}&limit={limit}", self.base_url);
        debug!(%url, "fetching eventlog batch");
        let response = send_json::<()>(&self.http, &token, reqwest::Method::GET, &url, None).await?;
        decode(response).await
    }

    async fn get_meta(&self, uuid: Uuid) -> Result<DocumentMeta, RepositoryError> {
        let token = self.token().await?;
        let url = format!("{}/documents/{uuid}/meta", self.base_url);
        let response = send_json::<()>(&self.http, &token, reqwest::Method::GET, &url, None).await?;
        decode(response).await
    }

    async fn get(&self, uuid: Uuid, version: i64) -> Result<Document, RepositoryError> {
        let token = self.token().await?;
        let url = format!("{}/documents/{uuid}?version={version}", self.base_url);
        let response = send_json::<()>(&self.http, &token, reqwest::Method::GET, &url, None).await?;
        decode(response).await
    }

    async fn get_status(
        &self,
        uuid: Uuid,
        name: &str,
        id: i64,
    ) -> Result<StatusDocument, RepositoryError> {
        let token = self.token().await?;
        let url = format!("{}/documents/{uuid}/status/{name}/{id}", self.base_url);
        let response = send_json::<()>(&self.http, &token, reqwest::Method::GET, &url, None).await?;
        decode(response).await
    }

    async fn get_attachments(
        &self,
        req: GetAttachmentsRequest,
    ) -> Result<Vec<AttachmentDownload>, RepositoryError> {
        let token = self.token().await?;
        let url = format!("{}/attachments", self.base_url);
        let response = send_json(&self.http, &token, reqwest::Method::POST, &url, Some(&req)).await?;
        decode(response).await
    }

    async fn download_attachment(&self, download_link: &str) -> Result<Vec<u8>, RepositoryError> {
        let token = self.token().await?;
        let response = self
            .http
            .get(download_link)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| RepositoryError::Other(format!("download failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RepositoryError::from_response_status(status, body));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| RepositoryError::Other(format!("failed to read body: {e}")))
    }
}

/// HTTP client for the target repository (`Update`, `CreateUpload`,
/// `Delete`).
pub struct HttpTargetRepositoryClient {
    http: Client,
    base_url: String,
    tokens: Arc<ClientCredentialsTokenProvider>,
}

impl HttpTargetRepositoryClient {
    pub fn new(base_url: impl Into<String>, tokens: Arc<ClientCredentialsTokenProvider>) -> Self {
        Self {
            http: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("reqwest client construction cannot fail with no custom TLS config"),
            base_url: base_url.into(),
            tokens,
        }
    }

    async fn token(&self) -> Result<String, RepositoryError> {
        self.tokens
            .token()
            .await
            .map_err(|e| RepositoryError::Other(format!("token fetch failed: {e}")))
    }
}

#[async_trait]
impl TargetRepositoryClient for HttpTargetRepositoryClient {
    async fn update(&self, req: &UpdateRequest) -> Result<UpdateResult, RepositoryError> {
        let token = self.token().await?;
        let url = format!("{}/documents/{}", self.base_url, req.uuid);
        let response = send_json(&self.http, &token, reqwest::Method::PUT, &url, Some(req)).await?;
        decode(response).await
    }

    async fn create_upload(
        &self,
        req: &CreateUploadRequest,
    ) -> Result<CreateUploadResult, RepositoryError> {
        let token = self.token().await?;
        let url = format!("{}/uploads", self.base_url);
        let response = send_json(&self.http, &token, reqwest::Method::POST, &url, Some(req)).await?;
        decode(response).await
    }

    async fn delete(&self, req: &DeleteRequest) -> Result<(), RepositoryError> {
        let token = self.token().await?;
        let url = format!("{}/documents/{}", self.base_url, req.uuid);
        let response = send_json(&self.http, &token, reqwest::Method::DELETE, &url, Some(req)).await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RepositoryError::from_response_status(status, body));
        }
        Ok(())
    }

    async fn upload_attachment(
        &self,
        url: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<(), RepositoryError> {
        let mut builder = self.http.put(url).body(bytes);
        if let Some(content_type) = content_type {
            builder = builder.header(reqwest::header::CONTENT_TYPE, content_type);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| RepositoryError::Other(format!("upload failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RepositoryError::from_response_status(status, body));
        }
        Ok(())
    }
}
