//! Axum route handlers for candidate profiles.

use axum::{
    extract::{rejection::PathRejection, FromRequest, Multipart, Path, Request, State},
    http::header,
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::{Profile, ProfilePayload};
use crate::state::AppState;
use crate::store::blob::{guess_mime_type, resume_key};

const RESUME_FIELD: &str = "resume_file";

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CreateProfileResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub profile_id: Uuid,
    pub created: bool,
}

/// Flat profile view with skills in their comma-joined display form.
#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub phone_number: String,
    pub primary_email: String,
    pub alternative_email: Option<String>,
    pub portfolio_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub leetcode_url: Option<String>,
    pub education_degree: Option<String>,
    pub education_field: Option<String>,
    pub university_name: Option<String>,
    pub graduation_year: Option<i32>,
    pub gpa: Option<f64>,
    pub programming_languages: String,
    pub python_frameworks: String,
    pub frontend_technologies: String,
    pub mobile_development: String,
    pub databases: String,
    pub cloud_devops: String,
    pub deployment_platforms: String,
    pub integrations: String,
    pub development_practices: String,
    pub professional_experience: String,
    pub projects: String,
    pub has_resume: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Profile> for ProfileView {
    fn from(profile: Profile) -> Self {
        let has_resume = profile.has_resume();
        let skills = profile.skills;
        Self {
            id: profile.id,
            name: profile.name,
            location: profile.location,
            phone_number: profile.phone_number,
            primary_email: profile.primary_email,
            alternative_email: profile.alternative_email,
            portfolio_url: profile.links.portfolio_url,
            linkedin_url: profile.links.linkedin_url,
            github_url: profile.links.github_url,
            leetcode_url: profile.links.leetcode_url,
            education_degree: profile.education.degree,
            education_field: profile.education.field,
            university_name: profile.education.institution,
            graduation_year: profile.education.graduation_year,
            gpa: profile.education.gpa,
            programming_languages: skills.programming_languages.to_string(),
            python_frameworks: skills.python_frameworks.to_string(),
            frontend_technologies: skills.frontend_technologies.to_string(),
            mobile_development: skills.mobile_development.to_string(),
            databases: skills.databases.to_string(),
            cloud_devops: skills.cloud_devops.to_string(),
            deployment_platforms: skills.deployment_platforms.to_string(),
            integrations: skills.integrations.to_string(),
            development_practices: skills.development_practices.to_string(),
            professional_experience: profile.professional_experience,
            projects: profile.projects,
            has_resume,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GetProfileResponse {
    pub status: &'static str,
    pub profile: ProfileView,
}

/// An uploaded resume held in memory until the profile is validated.
struct ResumeUpload {
    file_name: String,
    content_type: String,
    content: Bytes,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/create-profile/
///
/// Accepts JSON or multipart form data (with an optional `resume_file`).
/// Creates the profile, or updates the one with the same primary email.
pub async fn handle_create_profile(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<CreateProfileResponse>, AppError> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let (payload, upload) = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        read_multipart(multipart).await?
    } else {
        let Json(payload) = Json::<ProfilePayload>::from_request(request, &state).await?;
        (payload, None)
    };

    let input = payload.into_input()?;

    let resume_key = match upload {
        Some(upload) => {
            let key = resume_key(&upload.file_name);
            state
                .blobs
                .put(&key, upload.content, &upload.content_type)
                .await?;
            Some(key)
        }
        None => None,
    };

    let (profile, created) = match state
        .profiles
        .upsert_by_email(input, resume_key.clone())
        .await
    {
        Ok(saved) => saved,
        Err(e) => {
            if let Some(key) = &resume_key {
                warn!("Profile save failed; uploaded resume {key} is orphaned");
            }
            return Err(e);
        }
    };
    info!(
        "Profile {} {} (has_resume={})",
        profile.id,
        if created { "created" } else { "updated" },
        profile.has_resume()
    );

    Ok(Json(CreateProfileResponse {
        status: "success",
        message: if created {
            "Profile created"
        } else {
            "Profile updated"
        },
        profile_id: profile.id,
        created,
    }))
}

/// Splits a multipart body into text fields (deserialized as a profile payload)
/// and the optional resume file.
async fn read_multipart(
    mut multipart: Multipart,
) -> Result<(ProfilePayload, Option<ResumeUpload>), AppError> {
    let mut fields = Map::new();
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == RESUME_FIELD {
            let file_name = field.file_name().unwrap_or("resume").to_string();
            let declared = field.content_type().map(str::to_string);
            let content = field.bytes().await?;
            if content.is_empty() {
                continue;
            }
            let content_type = declared
                .filter(|ct| ct != "application/octet-stream")
                .unwrap_or_else(|| guess_mime_type(&file_name).to_string());
            upload = Some(ResumeUpload {
                file_name,
                content_type,
                content,
            });
        } else {
            let text = field.text().await?;
            fields.insert(name, Value::String(text));
        }
    }

    let payload = serde_json::from_value(Value::Object(fields))
        .map_err(|e| AppError::Validation(format!("Invalid profile fields: {e}")))?;
    Ok((payload, upload))
}

/// GET /api/get-profile/:id/
pub async fn handle_get_profile(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<GetProfileResponse>, AppError> {
    let Path(profile_id) = path?;
    let profile = state
        .profiles
        .get(profile_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User profile not found".to_string()))?;

    Ok(Json(GetProfileResponse {
        status: "success",
        profile: ProfileView::from(profile),
    }))
}
