//! Dispatch: one transport call, one history record.
//!
//! Every attempt writes exactly one `SentEmailRecord`, whichever way the
//! transport call goes. A resend reuses the stored subject/body/recipient and
//! updates the same record's status. Batch operations run sequentially and an
//! item's failure never touches the other items.

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::dispatch::attachments::resolve_attachments;
use crate::dispatch::transport::{MailTransport, OutboundEmail};
use crate::errors::AppError;
use crate::models::profile::non_empty;
use crate::models::sent_email::{NewSentEmail, SendStatus, SentEmailRecord};
use crate::state::AppState;
use crate::store::HistoryStore;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Dispatch {
    /// Originating generation request, when there was one.
    pub request_id: Option<Uuid>,
    pub email: OutboundEmail,
    /// Whether the resume made it into `email.attachments`.
    pub resume_attached: bool,
}

/// The written record plus the transport error, if the send failed.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub record: SentEmailRecord,
    pub transport_error: Option<String>,
}

impl DispatchOutcome {
    /// Surfaces a failed send as `AppError::Transport`; the record is already stored.
    pub fn into_result(self) -> Result<SentEmailRecord, AppError> {
        match self.transport_error {
            None => Ok(self.record),
            Some(message) => Err(AppError::Transport(message)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchItemStatus {
    Sent,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub id: Uuid,
    pub status: BatchItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
    pub results: Vec<BatchItem>,
}

impl BatchReport {
    fn push(&mut self, item: BatchItem) {
        match item.status {
            BatchItemStatus::Sent => self.sent += 1,
            BatchItemStatus::Failed => self.failed += 1,
            BatchItemStatus::Skipped => self.skipped += 1,
        }
        self.results.push(item);
    }

    fn push_outcome(&mut self, id: Uuid, outcome: DispatchOutcome) {
        let status = if outcome.transport_error.is_some() {
            BatchItemStatus::Failed
        } else {
            BatchItemStatus::Sent
        };
        self.push(BatchItem {
            id,
            status,
            record_id: Some(outcome.record.id),
            error: outcome.transport_error,
        });
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Single sends
// ────────────────────────────────────────────────────────────────────────────

/// Sends once and records the outcome.
///
/// Fails without side effects when the transport is not configured. Otherwise
/// the only errors are store errors; a transport failure is reported in the
/// outcome after a `failed` record has been written.
pub async fn dispatch(
    transport: &dyn MailTransport,
    history: &dyn HistoryStore,
    outgoing: Dispatch,
) -> Result<DispatchOutcome, AppError> {
    if !transport.is_configured() {
        return Err(AppError::TransportNotConfigured);
    }

    let attachment_count = outgoing.email.attachments.len();
    let result = transport.send(&outgoing.email).await;

    let (status, resume_attached, transport_error) = match result {
        Ok(()) => {
            info!(
                "Email sent to {} with {attachment_count} attachment(s)",
                outgoing.email.to
            );
            (SendStatus::Sent, outgoing.resume_attached, None)
        }
        Err(e) => {
            error!("Email to {} failed: {e}", outgoing.email.to);
            (SendStatus::Failed, false, Some(e.to_string()))
        }
    };

    let OutboundEmail {
        to, subject, body, ..
    } = outgoing.email;
    let record = history
        .record(NewSentEmail {
            request_id: outgoing.request_id,
            recipient_email: to,
            subject,
            body,
            status,
            resume_attached,
        })
        .await?;

    Ok(DispatchOutcome {
        record,
        transport_error,
    })
}

/// Re-sends a stored record without attachments and updates its status in place.
pub async fn resend(
    transport: &dyn MailTransport,
    history: &dyn HistoryStore,
    record_id: Uuid,
) -> Result<DispatchOutcome, AppError> {
    let existing = history
        .get(record_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Sent email {record_id} not found")))?;

    if !transport.is_configured() {
        return Err(AppError::TransportNotConfigured);
    }

    let email = OutboundEmail {
        to: existing.recipient_email.clone(),
        subject: existing.subject.clone(),
        body: existing.body.clone(),
        attachments: Vec::new(),
    };

    let (status, transport_error) = match transport.send(&email).await {
        Ok(()) => {
            info!("Resent email {record_id} to {}", existing.recipient_email);
            (SendStatus::Sent, None)
        }
        Err(e) => {
            error!("Resend of {record_id} failed: {e}");
            (SendStatus::Failed, Some(e.to_string()))
        }
    };

    let record = history.update_status(record_id, status).await?;
    Ok(DispatchOutcome {
        record,
        transport_error,
    })
}

/// Optional replacements for a stored request's subject and body.
#[derive(Debug, Clone, Default)]
pub struct SendOverrides {
    pub subject: Option<String>,
    pub body: Option<String>,
}

/// Sends the body generated for a stored request, attaching the linked
/// profile's resume when there is one.
pub async fn send_request(
    state: &AppState,
    request_id: Uuid,
    overrides: SendOverrides,
) -> Result<DispatchOutcome, AppError> {
    let request = state
        .requests
        .get(request_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Generation request {request_id} not found")))?;

    let body = non_empty(overrides.body)
        .or_else(|| non_empty(request.generated_body.clone()))
        .ok_or_else(|| {
            AppError::Validation(format!(
                "Generation request {request_id} has no generated email body"
            ))
        })?;
    let subject = non_empty(overrides.subject).unwrap_or_else(|| request.default_subject());

    if !state.transport.is_configured() {
        return Err(AppError::TransportNotConfigured);
    }

    let profile = match request.profile_id {
        Some(profile_id) => {
            let profile = state.profiles.get(profile_id).await?;
            if profile.is_none() {
                warn!("Profile {profile_id} for request {request_id} no longer exists");
            }
            profile
        }
        None => None,
    };
    let resolved = match &profile {
        Some(profile) => {
            resolve_attachments(state.blobs.as_ref(), profile, None, Utc::now().date_naive())
                .await
        }
        None => Default::default(),
    };
    let resume_attached = resolved.resume_attached();

    dispatch(
        state.transport.as_ref(),
        state.history.as_ref(),
        Dispatch {
            request_id: Some(request.id),
            email: OutboundEmail {
                to: request.recipient_email,
                subject,
                body,
                attachments: resolved.into_vec(),
            },
            resume_attached,
        },
    )
    .await
}

// ────────────────────────────────────────────────────────────────────────────
// Batches
// ────────────────────────────────────────────────────────────────────────────

/// Sends each stored request in order. Requests without a body are skipped.
pub async fn send_requests_batch(
    state: &AppState,
    request_ids: &[Uuid],
) -> Result<BatchReport, AppError> {
    if !state.transport.is_configured() {
        return Err(AppError::TransportNotConfigured);
    }

    let mut report = BatchReport::default();
    for &id in request_ids {
        match send_request(state, id, SendOverrides::default()).await {
            Ok(outcome) => report.push_outcome(id, outcome),
            Err(e @ (AppError::Validation(_) | AppError::NotFound(_))) => {
                warn!("Skipping request {id} in batch: {e}");
                report.push(BatchItem {
                    id,
                    status: BatchItemStatus::Skipped,
                    record_id: None,
                    error: Some(e.to_string()),
                });
            }
            Err(e) => {
                error!("Request {id} in batch failed: {e}");
                report.push(BatchItem {
                    id,
                    status: BatchItemStatus::Failed,
                    record_id: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    info!(
        "Batch send finished: {} sent, {} failed, {} skipped",
        report.sent, report.failed, report.skipped
    );
    Ok(report)
}

/// Resends each stored record in order.
pub async fn resend_batch(
    transport: &dyn MailTransport,
    history: &dyn HistoryStore,
    record_ids: &[Uuid],
) -> Result<BatchReport, AppError> {
    if !transport.is_configured() {
        return Err(AppError::TransportNotConfigured);
    }

    let mut report = BatchReport::default();
    for &id in record_ids {
        match resend(transport, history, id).await {
            Ok(outcome) => report.push_outcome(id, outcome),
            Err(e @ AppError::NotFound(_)) => report.push(BatchItem {
                id,
                status: BatchItemStatus::Skipped,
                record_id: None,
                error: Some(e.to_string()),
            }),
            Err(e) => {
                error!("Resend of {id} in batch failed: {e}");
                report.push(BatchItem {
                    id,
                    status: BatchItemStatus::Failed,
                    record_id: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }
    Ok(report)
}
