use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::{Education, Profile, ProfileInput, ProfileLinks, SkillList, Skills};
use crate::models::request::{GenerationRequest, NewGenerationRequest};
use crate::models::sent_email::{NewSentEmail, SendStatus, SentEmailRecord, SentEmailRow};
use crate::store::{HistoryStore, ProfileStore, RequestStore};

/// Postgres-backed implementation of every record store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Profiles
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, FromRow)]
struct ProfileRow {
    id: Uuid,
    name: String,
    location: String,
    phone_number: String,
    primary_email: String,
    alternative_email: Option<String>,
    portfolio_url: Option<String>,
    linkedin_url: Option<String>,
    github_url: Option<String>,
    leetcode_url: Option<String>,
    education_degree: Option<String>,
    education_field: Option<String>,
    university_name: Option<String>,
    graduation_year: Option<i32>,
    gpa: Option<f64>,
    programming_languages: String,
    python_frameworks: String,
    frontend_technologies: String,
    mobile_development: String,
    databases: String,
    cloud_devops: String,
    deployment_platforms: String,
    integrations: String,
    development_practices: String,
    professional_experience: String,
    projects: String,
    resume_key: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct UpsertedProfileRow {
    #[sqlx(flatten)]
    profile: ProfileRow,
    created: bool,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            id: row.id,
            name: row.name,
            location: row.location,
            phone_number: row.phone_number,
            primary_email: row.primary_email,
            alternative_email: row.alternative_email,
            links: ProfileLinks {
                portfolio_url: row.portfolio_url,
                linkedin_url: row.linkedin_url,
                github_url: row.github_url,
                leetcode_url: row.leetcode_url,
            },
            education: Education {
                degree: row.education_degree,
                field: row.education_field,
                institution: row.university_name,
                graduation_year: row.graduation_year,
                gpa: row.gpa,
            },
            skills: Skills {
                programming_languages: SkillList::parse(&row.programming_languages),
                python_frameworks: SkillList::parse(&row.python_frameworks),
                frontend_technologies: SkillList::parse(&row.frontend_technologies),
                mobile_development: SkillList::parse(&row.mobile_development),
                databases: SkillList::parse(&row.databases),
                cloud_devops: SkillList::parse(&row.cloud_devops),
                deployment_platforms: SkillList::parse(&row.deployment_platforms),
                integrations: SkillList::parse(&row.integrations),
                development_practices: SkillList::parse(&row.development_practices),
            },
            professional_experience: row.professional_experience,
            projects: row.projects,
            resume_key: row.resume_key,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn get(&self, id: Uuid) -> Result<Option<Profile>, AppError> {
        let row = sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Profile::from))
    }

    async fn upsert_by_email(
        &self,
        input: ProfileInput,
        resume_key: Option<String>,
    ) -> Result<(Profile, bool), AppError> {
        // Single statement: the unique index on primary_email serialises
        // concurrent creates for the same address.
        let row = sqlx::query_as::<_, UpsertedProfileRow>(
            r#"
            INSERT INTO profiles
                (id, name, location, phone_number, primary_email, alternative_email,
                 portfolio_url, linkedin_url, github_url, leetcode_url,
                 education_degree, education_field, university_name, graduation_year, gpa,
                 programming_languages, python_frameworks, frontend_technologies,
                 mobile_development, databases, cloud_devops, deployment_platforms,
                 integrations, development_practices,
                 professional_experience, projects, resume_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27)
            ON CONFLICT (primary_email) DO UPDATE SET
                name = EXCLUDED.name,
                location = EXCLUDED.location,
                phone_number = EXCLUDED.phone_number,
                alternative_email = EXCLUDED.alternative_email,
                portfolio_url = EXCLUDED.portfolio_url,
                linkedin_url = EXCLUDED.linkedin_url,
                github_url = EXCLUDED.github_url,
                leetcode_url = EXCLUDED.leetcode_url,
                education_degree = EXCLUDED.education_degree,
                education_field = EXCLUDED.education_field,
                university_name = EXCLUDED.university_name,
                graduation_year = EXCLUDED.graduation_year,
                gpa = EXCLUDED.gpa,
                programming_languages = EXCLUDED.programming_languages,
                python_frameworks = EXCLUDED.python_frameworks,
                frontend_technologies = EXCLUDED.frontend_technologies,
                mobile_development = EXCLUDED.mobile_development,
                databases = EXCLUDED.databases,
                cloud_devops = EXCLUDED.cloud_devops,
                deployment_platforms = EXCLUDED.deployment_platforms,
                integrations = EXCLUDED.integrations,
                development_practices = EXCLUDED.development_practices,
                professional_experience = EXCLUDED.professional_experience,
                projects = EXCLUDED.projects,
                resume_key = COALESCE(EXCLUDED.resume_key, profiles.resume_key),
                updated_at = now()
            RETURNING *, (xmax = 0) AS created
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.location)
        .bind(&input.phone_number)
        .bind(&input.primary_email)
        .bind(&input.alternative_email)
        .bind(&input.links.portfolio_url)
        .bind(&input.links.linkedin_url)
        .bind(&input.links.github_url)
        .bind(&input.links.leetcode_url)
        .bind(&input.education.degree)
        .bind(&input.education.field)
        .bind(&input.education.institution)
        .bind(input.education.graduation_year)
        .bind(input.education.gpa)
        .bind(input.skills.programming_languages.to_string())
        .bind(input.skills.python_frameworks.to_string())
        .bind(input.skills.frontend_technologies.to_string())
        .bind(input.skills.mobile_development.to_string())
        .bind(input.skills.databases.to_string())
        .bind(input.skills.cloud_devops.to_string())
        .bind(input.skills.deployment_platforms.to_string())
        .bind(input.skills.integrations.to_string())
        .bind(input.skills.development_practices.to_string())
        .bind(&input.professional_experience)
        .bind(&input.projects)
        .bind(&resume_key)
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Profile {} {} for {}",
            row.profile.id,
            if row.created { "created" } else { "updated" },
            row.profile.primary_email
        );

        Ok((Profile::from(row.profile), row.created))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Generation requests
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl RequestStore for PgStore {
    async fn create(&self, request: NewGenerationRequest) -> Result<GenerationRequest, AppError> {
        Ok(sqlx::query_as::<_, GenerationRequest>(
            r#"
            INSERT INTO generation_requests
                (id, profile_id, applicant_name, skills, recipient_email,
                 company, role, job_description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.profile_id)
        .bind(&request.applicant_name)
        .bind(&request.skills)
        .bind(&request.recipient_email)
        .bind(&request.company)
        .bind(&request.role)
        .bind(&request.job_description)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get(&self, id: Uuid) -> Result<Option<GenerationRequest>, AppError> {
        Ok(
            sqlx::query_as::<_, GenerationRequest>(
                "SELECT * FROM generation_requests WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?,
        )
    }

    async fn set_generated_body(&self, id: Uuid, body: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE generation_requests SET generated_body = $1, updated_at = now() WHERE id = $2",
        )
        .bind(body)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Generation request {id} not found")));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sent email history
// ────────────────────────────────────────────────────────────────────────────

fn into_record(row: SentEmailRow) -> Result<SentEmailRecord, AppError> {
    SentEmailRecord::try_from(row).map_err(|e| AppError::Internal(anyhow::anyhow!(e)))
}

#[async_trait]
impl HistoryStore for PgStore {
    async fn record(&self, email: NewSentEmail) -> Result<SentEmailRecord, AppError> {
        let row = sqlx::query_as::<_, SentEmailRow>(
            r#"
            INSERT INTO sent_emails
                (id, request_id, recipient_email, subject, body, status, resume_attached)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email.request_id)
        .bind(&email.recipient_email)
        .bind(&email.subject)
        .bind(&email.body)
        .bind(email.status.as_str())
        .bind(email.resume_attached)
        .fetch_one(&self.pool)
        .await?;
        into_record(row)
    }

    async fn get(&self, id: Uuid) -> Result<Option<SentEmailRecord>, AppError> {
        sqlx::query_as::<_, SentEmailRow>("SELECT * FROM sent_emails WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(into_record)
            .transpose()
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: SendStatus,
    ) -> Result<SentEmailRecord, AppError> {
        let row = sqlx::query_as::<_, SentEmailRow>(
            "UPDATE sent_emails SET status = $1 WHERE id = $2 RETURNING *",
        )
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Sent email {id} not found")))?;
        into_record(row)
    }

    async fn list(&self, limit: i64) -> Result<Vec<SentEmailRecord>, AppError> {
        sqlx::query_as::<_, SentEmailRow>(
            "SELECT * FROM sent_emails ORDER BY sent_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(into_record)
        .collect()
    }
}
