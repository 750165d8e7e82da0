//! Axum route handler for cover letter PDFs.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::cover_letter::{cover_letter_filename, render_cover_letter, CoverLetterDetails};
use crate::errors::AppError;
use crate::generation::generator::JobPosting;
use crate::models::profile::{non_empty, required};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CoverLetterRequest {
    pub profile_id: Option<Uuid>,
    pub company: Option<String>,
    pub role: Option<String>,
    pub job_description: Option<String>,
    #[serde(flatten)]
    pub details: CoverLetterDetails,
}

/// POST /api/generate-cover-letter-pdf/
///
/// Returns the PDF bytes with an attachment filename. No record is written.
pub async fn handle_generate_cover_letter(
    State(state): State<AppState>,
    body: Result<Json<CoverLetterRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = body?;

    let profile_id = request
        .profile_id
        .ok_or_else(|| AppError::missing_field("profile_id"))?;
    let job = JobPosting {
        company: required(request.company, "company")?,
        role: required(request.role, "role")?,
        job_description: non_empty(request.job_description),
    };
    let details = request.details.normalized();

    let profile = state
        .profiles
        .get(profile_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User profile not found".to_string()))?;

    let filename = cover_letter_filename(&profile.name, &job.company, &job.role);
    let date = Utc::now().date_naive();
    let pdf = tokio::task::spawn_blocking(move || {
        render_cover_letter(&profile, &job, &details, date)
    })
    .await
    .map_err(|e| AppError::Render(format!("render task failed: {e}")))??;

    info!("Rendered cover letter {filename} ({} bytes)", pdf.len());

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        pdf,
    )
        .into_response())
}
