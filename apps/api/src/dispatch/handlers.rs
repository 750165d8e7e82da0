//! Axum route handlers for sending, resending and email history.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cover_letter::CoverLetterDetails;
use crate::dispatch::attachments::{resolve_attachments, CoverLetterSpec, ResolvedAttachments};
use crate::dispatch::engine::{
    dispatch, resend, resend_batch, send_request, send_requests_batch, BatchReport, Dispatch,
    SendOverrides,
};
use crate::dispatch::transport::OutboundEmail;
use crate::errors::AppError;
use crate::generation::generator::JobPosting;
use crate::models::profile::{non_empty, required, Profile};
use crate::models::sent_email::SentEmailRecord;
use crate::state::AppState;

const DEFAULT_HISTORY_LIMIT: i64 = 50;
const MAX_HISTORY_LIMIT: i64 = 500;

/// Validates a recipient address taken from the `hr_email` field.
pub fn recipient(value: Option<String>) -> Result<String, AppError> {
    let address = required(value, "hr_email")?;
    address
        .parse::<lettre::Address>()
        .map_err(|_| AppError::Validation(format!("Invalid email address: {address}")))?;
    Ok(address)
}

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SendEmailRequest {
    pub hr_email: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub request_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SendWithResumeRequest {
    pub hr_email: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub profile_id: Option<Uuid>,
    pub request_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SendWithCoverLetterRequest {
    pub hr_email: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub profile_id: Option<Uuid>,
    pub company: Option<String>,
    pub role: Option<String>,
    pub job_description: Option<String>,
    pub request_id: Option<Uuid>,
    #[serde(flatten)]
    pub details: CoverLetterDetails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SendStoredRequest {
    pub subject: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendBatchRequest {
    pub request_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ResendBatchRequest {
    pub record_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub record_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_attached: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter_attached: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<&'static str>>,
}

impl SendResponse {
    fn sent(record: &SentEmailRecord) -> Self {
        Self {
            status: "sent",
            message: "Email sent successfully",
            record_id: record.id,
            resume_attached: None,
            cover_letter_attached: None,
            attachments: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub count: usize,
    pub emails: Vec<SentEmailRecord>,
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

struct Envelope {
    to: String,
    subject: String,
    body: String,
}

fn envelope(
    hr_email: Option<String>,
    subject: Option<String>,
    body: Option<String>,
) -> Result<Envelope, AppError> {
    let to = recipient(hr_email)?;
    Ok(Envelope {
        to,
        subject: required(subject, "subject")?,
        body: required(body, "body")?,
    })
}

async fn load_profile(state: &AppState, profile_id: Option<Uuid>) -> Result<Profile, AppError> {
    let profile_id = profile_id.ok_or_else(|| AppError::missing_field("profile_id"))?;
    state
        .profiles
        .get(profile_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User profile not found".to_string()))
}

/// Checks a client-supplied `request_id` before anything is sent, so the
/// history record can always reference it.
async fn linked_request(
    state: &AppState,
    request_id: Option<Uuid>,
) -> Result<Option<Uuid>, AppError> {
    let Some(id) = request_id else {
        return Ok(None);
    };
    state
        .requests
        .get(id)
        .await?
        .map(|request| Some(request.id))
        .ok_or_else(|| AppError::NotFound(format!("Generation request {id} not found")))
}

fn ensure_transport(state: &AppState) -> Result<(), AppError> {
    if state.transport.is_configured() {
        Ok(())
    } else {
        Err(AppError::TransportNotConfigured)
    }
}

async fn send_with_attachments(
    state: &AppState,
    envelope: Envelope,
    request_id: Option<Uuid>,
    resolved: ResolvedAttachments,
) -> Result<SentEmailRecord, AppError> {
    let resume_attached = resolved.resume_attached();
    dispatch(
        state.transport.as_ref(),
        state.history.as_ref(),
        Dispatch {
            request_id,
            email: OutboundEmail {
                to: envelope.to,
                subject: envelope.subject,
                body: envelope.body,
                attachments: resolved.into_vec(),
            },
            resume_attached,
        },
    )
    .await?
    .into_result()
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/send-email/
pub async fn handle_send_email(
    State(state): State<AppState>,
    body: Result<Json<SendEmailRequest>, JsonRejection>,
) -> Result<Json<SendResponse>, AppError> {
    let Json(request) = body?;
    let envelope = envelope(request.hr_email, request.subject, request.body)?;
    let request_id = linked_request(&state, request.request_id).await?;
    ensure_transport(&state)?;

    let record = send_with_attachments(
        &state,
        envelope,
        request_id,
        ResolvedAttachments::default(),
    )
    .await?;

    Ok(Json(SendResponse::sent(&record)))
}

/// POST /api/send-email-with-resume/
///
/// A missing or unreadable resume does not fail the send; it shows up as
/// `resume_attached: false`.
pub async fn handle_send_email_with_resume(
    State(state): State<AppState>,
    body: Result<Json<SendWithResumeRequest>, JsonRejection>,
) -> Result<Json<SendResponse>, AppError> {
    let Json(request) = body?;
    let envelope = envelope(request.hr_email, request.subject, request.body)?;
    let profile = load_profile(&state, request.profile_id).await?;
    let request_id = linked_request(&state, request.request_id).await?;
    ensure_transport(&state)?;

    let resolved = resolve_attachments(
        state.blobs.as_ref(),
        &profile,
        None,
        Utc::now().date_naive(),
    )
    .await;
    let labels = resolved.labels();
    let resume_attached = resolved.resume_attached();

    let record = send_with_attachments(&state, envelope, request_id, resolved).await?;

    Ok(Json(SendResponse {
        resume_attached: Some(resume_attached),
        attachments: Some(labels),
        ..SendResponse::sent(&record)
    }))
}

/// POST /api/send-email-with-resume-and-cover-letter/
pub async fn handle_send_email_with_cover_letter(
    State(state): State<AppState>,
    body: Result<Json<SendWithCoverLetterRequest>, JsonRejection>,
) -> Result<Json<SendResponse>, AppError> {
    let Json(request) = body?;
    let envelope = envelope(request.hr_email, request.subject, request.body)?;
    let job = JobPosting {
        company: required(request.company, "company")?,
        role: required(request.role, "role")?,
        job_description: non_empty(request.job_description),
    };
    let profile = load_profile(&state, request.profile_id).await?;
    let request_id = linked_request(&state, request.request_id).await?;
    ensure_transport(&state)?;

    let resolved = resolve_attachments(
        state.blobs.as_ref(),
        &profile,
        Some(CoverLetterSpec {
            job,
            details: request.details.normalized(),
        }),
        Utc::now().date_naive(),
    )
    .await;
    let labels = resolved.labels();
    let resume_attached = resolved.resume_attached();
    let cover_letter_attached = resolved.cover_letter_attached();

    let record = send_with_attachments(&state, envelope, request_id, resolved).await?;

    Ok(Json(SendResponse {
        resume_attached: Some(resume_attached),
        cover_letter_attached: Some(cover_letter_attached),
        attachments: Some(labels),
        ..SendResponse::sent(&record)
    }))
}

/// POST /api/requests/:id/send/
///
/// An empty body sends the stored email unchanged. A non-empty body must be
/// valid JSON overrides; anything else is rejected before sending.
pub async fn handle_send_request(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Bytes,
) -> Result<Json<SendResponse>, AppError> {
    let Path(request_id) = path?;
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        SendStoredRequest::default()
    } else {
        let Json(overrides) = Json::<SendStoredRequest>::from_bytes(&body)?;
        overrides
    };
    let outcome = send_request(
        &state,
        request_id,
        SendOverrides {
            subject: request.subject,
            body: request.body,
        },
    )
    .await?;
    let resume_attached = outcome.record.resume_attached;
    let record = outcome.into_result()?;

    Ok(Json(SendResponse {
        resume_attached: Some(resume_attached),
        ..SendResponse::sent(&record)
    }))
}

/// POST /api/requests/send-batch/
pub async fn handle_send_batch(
    State(state): State<AppState>,
    body: Result<Json<SendBatchRequest>, JsonRejection>,
) -> Result<Json<BatchReport>, AppError> {
    let Json(request) = body?;
    Ok(Json(send_requests_batch(&state, &request.request_ids).await?))
}

/// GET /api/sent-emails/?limit=
pub async fn handle_list_sent(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<HistoryResponse>, AppError> {
    let Query(query) = query?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let emails = state.history.list(limit).await?;
    Ok(Json(HistoryResponse {
        count: emails.len(),
        emails,
    }))
}

/// GET /api/sent-emails/:id/
pub async fn handle_get_sent(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SentEmailRecord>, AppError> {
    let Path(record_id) = path?;
    state
        .history
        .get(record_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Sent email {record_id} not found")))
}

/// POST /api/sent-emails/:id/resend/
pub async fn handle_resend(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SendResponse>, AppError> {
    let Path(record_id) = path?;
    let record = resend(state.transport.as_ref(), state.history.as_ref(), record_id)
        .await?
        .into_result()?;
    Ok(Json(SendResponse::sent(&record)))
}

/// POST /api/sent-emails/resend-batch/
pub async fn handle_resend_batch(
    State(state): State<AppState>,
    body: Result<Json<ResendBatchRequest>, JsonRejection>,
) -> Result<Json<BatchReport>, AppError> {
    let Json(request) = body?;
    Ok(Json(
        resend_batch(
            state.transport.as_ref(),
            state.history.as_ref(),
            &request.record_ids,
        )
        .await?,
    ))
}
