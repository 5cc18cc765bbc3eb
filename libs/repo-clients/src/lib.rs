//! HTTP clients for the source and target document repositories.

pub mod error;
pub mod http;
pub mod traits;

pub use error::RepositoryError;
pub use http::{HttpSourceRepositoryClient, HttpTargetRepositoryClient};
pub use traits::{AttachmentDownload, GetAttachmentsRequest, SourceRepositoryClient, TargetRepositoryClient};
