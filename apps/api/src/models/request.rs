use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One "produce an application email for job X" request.
///
/// `generated_body` is null until the generation step runs; once set it is never
/// cleared, only overwritten by a later generation on the same request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct GenerationRequest {
    pub id: Uuid,
    pub profile_id: Option<Uuid>,
    /// Legacy path: ad hoc applicant name when no profile is referenced.
    pub applicant_name: Option<String>,
    /// Legacy path: comma-joined skills when no profile is referenced.
    pub skills: Option<String>,
    pub recipient_email: String,
    pub company: String,
    pub role: String,
    pub job_description: Option<String>,
    pub generated_body: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GenerationRequest {
    /// Subject used when a stored request is sent without an explicit subject.
    pub fn default_subject(&self) -> String {
        format!("Application for {} at {}", self.role, self.company)
    }
}

/// Fields supplied when a generation request is first recorded.
#[derive(Debug, Clone)]
pub struct NewGenerationRequest {
    pub profile_id: Option<Uuid>,
    pub applicant_name: Option<String>,
    pub skills: Option<String>,
    pub recipient_email: String,
    pub company: String,
    pub role: String,
    pub job_description: Option<String>,
}
