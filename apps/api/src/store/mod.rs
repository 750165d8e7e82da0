//! Persistence seams. Handlers and the dispatch engine only see these traits;
//! `postgres` and `blob` hold the production implementations.

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::{Profile, ProfileInput};
use crate::models::request::{GenerationRequest, NewGenerationRequest};
use crate::models::sent_email::{NewSentEmail, SendStatus, SentEmailRecord};

pub mod blob;
pub mod postgres;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Profile>, AppError>;

    /// Creates or updates the profile keyed by `primary_email`.
    /// A `None` resume key keeps whatever resume the profile already has.
    /// Returns the stored profile and whether it was newly created.
    async fn upsert_by_email(
        &self,
        input: ProfileInput,
        resume_key: Option<String>,
    ) -> Result<(Profile, bool), AppError>;
}

#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn create(&self, request: NewGenerationRequest) -> Result<GenerationRequest, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<GenerationRequest>, AppError>;

    async fn set_generated_body(&self, id: Uuid, body: &str) -> Result<(), AppError>;
}

/// Append-only email history. The only in-place mutation is a resend status update.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn record(&self, email: NewSentEmail) -> Result<SentEmailRecord, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<SentEmailRecord>, AppError>;

    async fn update_status(
        &self,
        id: Uuid,
        status: SendStatus,
    ) -> Result<SentEmailRecord, AppError>;

    /// Most recent first.
    async fn list(&self, limit: i64) -> Result<Vec<SentEmailRecord>, AppError>;
}

/// Binary content (resumes) referenced from records by key.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, content: Bytes, content_type: &str) -> Result<(), AppError>;

    async fn get(&self, key: &str) -> Result<Bytes, AppError>;
}
