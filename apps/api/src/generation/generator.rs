//! Application-email generation.
//!
//! Flow: record request → build prompt → remote generation → (on any failure)
//! deterministic fallback → persist body → return outcome.
//!
//! Generation never fails from the caller's point of view once the request row
//! exists; a failed remote call only marks the outcome as degraded.

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::fallback::render_fallback;
use crate::generation::prompts::build_prompt;
use crate::llm_client::TextGenerator;
use crate::models::profile::{Profile, SkillList};
use crate::models::request::NewGenerationRequest;
use crate::store::RequestStore;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Who the email is written for.
#[derive(Debug, Clone, Copy)]
pub enum Applicant<'a> {
    /// Stored profile (enhanced path).
    Profile(&'a Profile),
    /// Ad hoc name and skills (legacy path).
    Adhoc { name: &'a str, skills: &'a SkillList },
}

impl Applicant<'_> {
    fn profile_id(&self) -> Option<Uuid> {
        match self {
            Applicant::Profile(profile) => Some(profile.id),
            Applicant::Adhoc { .. } => None,
        }
    }
}

/// The job being applied for.
#[derive(Debug, Clone, PartialEq)]
pub struct JobPosting {
    pub company: String,
    pub role: String,
    pub job_description: Option<String>,
}

/// Result of one generation call. `degraded` is set when the body came from
/// the fallback template; `reason` then carries a short failure code.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub request_id: Uuid,
    pub body: String,
    pub degraded: bool,
    pub reason: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Generation pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Records a generation request, produces its body and persists it.
///
/// Only store failures surface as errors. Remote generation failures of any
/// kind (including blank output) fall back to the template.
pub async fn generate_application_email(
    requests: &dyn RequestStore,
    generator: &dyn TextGenerator,
    applicant: Applicant<'_>,
    job: &JobPosting,
    recipient_email: &str,
) -> Result<GenerationOutcome, AppError> {
    let (applicant_name, skills) = match applicant {
        Applicant::Profile(_) => (None, None),
        Applicant::Adhoc { name, skills } => (Some(name.to_string()), Some(skills.to_string())),
    };

    let request = requests
        .create(NewGenerationRequest {
            profile_id: applicant.profile_id(),
            applicant_name,
            skills,
            recipient_email: recipient_email.to_string(),
            company: job.company.clone(),
            role: job.role.clone(),
            job_description: job.job_description.clone(),
        })
        .await?;

    let prompt = build_prompt(&applicant, job);

    let (body, reason) = match generator.generate(&prompt).await {
        Ok(text) if !text.trim().is_empty() => (text.trim().to_string(), None),
        Ok(_) => {
            warn!("Generation for request {} returned blank text; using template", request.id);
            (render_fallback(&applicant, job), Some("generator_empty_response"))
        }
        Err(e) => {
            warn!("Generation for request {} failed: {e}; using template", request.id);
            (render_fallback(&applicant, job), Some(e.reason_code()))
        }
    };

    requests.set_generated_body(request.id, &body).await?;

    let degraded = reason.is_some();
    info!(
        "Generated email for request {} ({} at {}, degraded={degraded})",
        request.id, job.role, job.company
    );

    Ok(GenerationOutcome {
        request_id: request.id,
        body,
        degraded,
        reason: reason.map(str::to_string),
    })
}
