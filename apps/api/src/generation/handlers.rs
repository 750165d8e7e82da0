//! Axum route handlers for email generation.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dispatch::handlers::recipient;
use crate::errors::AppError;
use crate::generation::generator::{
    generate_application_email, Applicant, GenerationOutcome, JobPosting,
};
use crate::models::profile::{non_empty, required, SkillList};
use crate::state::AppState;

const LEGACY_FALLBACK_WARNING: &str = "AI generation failed, using template email";
const PROFILE_FALLBACK_WARNING: &str = "AI generation failed, using enhanced template email";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LegacyGenerateRequest {
    pub hr_email: Option<String>,
    pub company: Option<String>,
    pub role: Option<String>,
    pub name: Option<String>,
    pub skills: Option<SkillList>,
    pub job_description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileGenerateRequest {
    pub profile_id: Option<Uuid>,
    pub hr_email: Option<String>,
    pub company: Option<String>,
    pub role: Option<String>,
    pub job_description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub status: &'static str,
    pub email_text: String,
    pub request_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<Uuid>,
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl GenerateResponse {
    fn from_outcome(
        outcome: GenerationOutcome,
        profile_id: Option<Uuid>,
        warning: &'static str,
    ) -> Self {
        Self {
            status: "success",
            email_text: outcome.body,
            request_id: outcome.request_id,
            profile_id,
            degraded: outcome.degraded,
            warning: outcome.degraded.then_some(warning),
            reason: outcome.reason,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/generate-email/
///
/// Legacy path: ad hoc name and skills, no stored profile.
pub async fn handle_generate_email(
    State(state): State<AppState>,
    body: Result<Json<LegacyGenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    let Json(request) = body?;

    let hr_email = recipient(request.hr_email)?;
    let job = JobPosting {
        company: required(request.company, "company")?,
        role: required(request.role, "role")?,
        job_description: non_empty(request.job_description),
    };
    let name = required(request.name, "name")?;
    let skills = request
        .skills
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::missing_field("skills"))?;

    let outcome = generate_application_email(
        state.requests.as_ref(),
        state.generator.as_ref(),
        Applicant::Adhoc {
            name: &name,
            skills: &skills,
        },
        &job,
        &hr_email,
    )
    .await?;

    Ok(Json(GenerateResponse::from_outcome(
        outcome,
        None,
        LEGACY_FALLBACK_WARNING,
    )))
}

/// POST /api/generate-email-enhanced/
///
/// Profile-backed generation. The profile must exist.
pub async fn handle_generate_email_enhanced(
    State(state): State<AppState>,
    body: Result<Json<ProfileGenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    let Json(request) = body?;

    let profile_id = request.profile_id.ok_or_else(|| {
        AppError::Validation(
            "profile_id is required. Please create a user profile first using /api/create-profile/"
                .to_string(),
        )
    })?;
    let (Some(hr_email), Some(company), Some(role)) = (
        non_empty(request.hr_email),
        non_empty(request.company),
        non_empty(request.role),
    ) else {
        return Err(AppError::Validation(
            "Missing required fields: hr_email, company, role".to_string(),
        ));
    };
    let hr_email = recipient(Some(hr_email))?;

    let profile = state
        .profiles
        .get(profile_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User profile not found".to_string()))?;

    let job = JobPosting {
        company,
        role,
        job_description: non_empty(request.job_description),
    };

    let outcome = generate_application_email(
        state.requests.as_ref(),
        state.generator.as_ref(),
        Applicant::Profile(&profile),
        &job,
        &hr_email,
    )
    .await?;

    Ok(Json(GenerateResponse::from_outcome(
        outcome,
        Some(profile.id),
        PROFILE_FALLBACK_WARNING,
    )))
}
