use std::sync::Arc;

use crate::dispatch::transport::MailTransport;
use crate::llm_client::TextGenerator;
use crate::store::{BlobStore, HistoryStore, ProfileStore, RequestStore};

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Every external collaborator sits behind a trait object so tests can swap in fakes.
#[derive(Clone)]
pub struct AppState {
    pub profiles: Arc<dyn ProfileStore>,
    pub requests: Arc<dyn RequestStore>,
    pub history: Arc<dyn HistoryStore>,
    /// Resume binaries, referenced from profiles by key.
    pub blobs: Arc<dyn BlobStore>,
    pub generator: Arc<dyn TextGenerator>,
    pub transport: Arc<dyn MailTransport>,
}
