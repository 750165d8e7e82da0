//! In-memory fakes for every external collaborator, shared by unit and router tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

use crate::dispatch::transport::{MailTransport, OutboundEmail, TransportError};
use crate::errors::AppError;
use crate::llm_client::{GenerationError, TextGenerator};
use crate::models::profile::{Education, Profile, ProfileInput, ProfileLinks, SkillList, Skills};
use crate::models::request::{GenerationRequest, NewGenerationRequest};
use crate::models::sent_email::{NewSentEmail, SendStatus, SentEmailRecord};
use crate::state::AppState;
use crate::store::{BlobStore, HistoryStore, ProfileStore, RequestStore};

pub fn sample_profile() -> Profile {
    let now = Utc::now();
    Profile {
        id: Uuid::new_v4(),
        name: "Asha Rao".to_string(),
        location: "Pune, India".to_string(),
        phone_number: "+91 98000 00000".to_string(),
        primary_email: "asha@example.com".to_string(),
        alternative_email: None,
        links: ProfileLinks {
            portfolio_url: None,
            linkedin_url: Some("https://linkedin.com/in/asharao".to_string()),
            github_url: Some("https://github.com/asharao".to_string()),
            leetcode_url: None,
        },
        education: Education {
            degree: Some("B.Tech".to_string()),
            field: Some("Computer Science".to_string()),
            institution: Some("IIT Bombay".to_string()),
            graduation_year: Some(2022),
            gpa: Some(8.7),
        },
        skills: Skills {
            programming_languages: SkillList::parse("Rust, Python"),
            databases: SkillList::parse("PostgreSQL"),
            ..Skills::default()
        },
        professional_experience: "Two years building payment APIs at Globex.".to_string(),
        projects: "Open-source SMTP relay.".to_string(),
        resume_key: None,
        created_at: now,
        updated_at: now,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Record stores
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStore {
    profiles: Mutex<Vec<Profile>>,
    requests: Mutex<Vec<GenerationRequest>>,
    sent: Mutex<Vec<SentEmailRecord>>,
    fail_profile_writes: AtomicBool,
}

impl MemoryStore {
    pub fn insert_profile(&self, profile: Profile) {
        self.profiles.lock().unwrap().push(profile);
    }

    /// Makes every later profile upsert fail like a lost database connection.
    pub fn fail_profile_writes(&self) {
        self.fail_profile_writes.store(true, Ordering::SeqCst);
    }

    pub fn profile_count(&self) -> usize {
        self.profiles.lock().unwrap().len()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn sent_records(&self) -> Vec<SentEmailRecord> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<Profile>, AppError> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn upsert_by_email(
        &self,
        input: ProfileInput,
        resume_key: Option<String>,
    ) -> Result<(Profile, bool), AppError> {
        if self.fail_profile_writes.load(Ordering::SeqCst) {
            return Err(AppError::Internal(anyhow::anyhow!("connection closed")));
        }
        let mut profiles = self.profiles.lock().unwrap();
        let now = Utc::now();
        let existing = profiles
            .iter()
            .position(|p| p.primary_email == input.primary_email);

        let (profile, created) = match existing {
            Some(index) => {
                let profile = &mut profiles[index];
                profile.name = input.name;
                profile.location = input.location;
                profile.phone_number = input.phone_number;
                profile.alternative_email = input.alternative_email;
                profile.links = input.links;
                profile.education = input.education;
                profile.skills = input.skills;
                profile.professional_experience = input.professional_experience;
                profile.projects = input.projects;
                if resume_key.is_some() {
                    profile.resume_key = resume_key;
                }
                profile.updated_at = now;
                (profile.clone(), false)
            }
            None => {
                let profile = Profile {
                    id: Uuid::new_v4(),
                    name: input.name,
                    location: input.location,
                    phone_number: input.phone_number,
                    primary_email: input.primary_email,
                    alternative_email: input.alternative_email,
                    links: input.links,
                    education: input.education,
                    skills: input.skills,
                    professional_experience: input.professional_experience,
                    projects: input.projects,
                    resume_key,
                    created_at: now,
                    updated_at: now,
                };
                profiles.push(profile.clone());
                (profile, true)
            }
        };
        Ok((profile, created))
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn create(&self, request: NewGenerationRequest) -> Result<GenerationRequest, AppError> {
        let now = Utc::now();
        let row = GenerationRequest {
            id: Uuid::new_v4(),
            profile_id: request.profile_id,
            applicant_name: request.applicant_name,
            skills: request.skills,
            recipient_email: request.recipient_email,
            company: request.company,
            role: request.role,
            job_description: request.job_description,
            generated_body: None,
            created_at: now,
            updated_at: now,
        };
        self.requests.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn get(&self, id: Uuid) -> Result<Option<GenerationRequest>, AppError> {
        Ok(self
            .requests
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn set_generated_body(&self, id: Uuid, body: &str) -> Result<(), AppError> {
        let mut requests = self.requests.lock().unwrap();
        let request = requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Generation request {id} not found")))?;
        request.generated_body = Some(body.to_string());
        request.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn record(&self, email: NewSentEmail) -> Result<SentEmailRecord, AppError> {
        // Same foreign key as sent_emails.request_id.
        if let Some(request_id) = email.request_id {
            if !self.requests.lock().unwrap().iter().any(|r| r.id == request_id) {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "sent_emails.request_id {request_id} references no generation request"
                )));
            }
        }
        let record = SentEmailRecord {
            id: Uuid::new_v4(),
            request_id: email.request_id,
            recipient_email: email.recipient_email,
            subject: email.subject,
            body: email.body,
            status: email.status,
            resume_attached: email.resume_attached,
            sent_at: Utc::now(),
        };
        self.sent.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<SentEmailRecord>, AppError> {
        Ok(self.sent.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: SendStatus,
    ) -> Result<SentEmailRecord, AppError> {
        let mut sent = self.sent.lock().unwrap();
        let record = sent
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Sent email {id} not found")))?;
        record.status = status;
        Ok(record.clone())
    }

    async fn list(&self, limit: i64) -> Result<Vec<SentEmailRecord>, AppError> {
        let sent = self.sent.lock().unwrap();
        Ok(sent
            .iter()
            .rev()
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Blobs, generator, transport
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, (Bytes, String)>>,
}

impl MemoryBlobStore {
    pub fn insert(&self, key: &str, content: Vec<u8>) {
        self.blobs.lock().unwrap().insert(
            key.to_string(),
            (Bytes::from(content), "application/octet-stream".to_string()),
        );
    }

    pub fn keys(&self) -> Vec<String> {
        self.blobs.lock().unwrap().keys().cloned().collect()
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.blobs.lock().unwrap().get(key).map(|(_, ct)| ct.clone())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, content: Bytes, content_type: &str) -> Result<(), AppError> {
        self.blobs
            .lock()
            .unwrap()
            .insert(key.to_string(), (content, content_type.to_string()));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, AppError> {
        self.blobs
            .lock()
            .unwrap()
            .get(key)
            .map(|(content, _)| content.clone())
            .ok_or_else(|| AppError::Storage(format!("no object at '{key}'")))
    }
}

/// Returns a canned reply, or fails every call.
pub struct FakeGenerator {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().ok_or(GenerationError::Api {
            status: 503,
            message: "model overloaded".to_string(),
        })
    }
}

/// Records every message; fails for recipients in the failing set.
pub struct FakeTransport {
    configured: bool,
    failing: Mutex<HashSet<String>>,
    sent: Mutex<Vec<OutboundEmail>>,
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self {
            configured: true,
            failing: Mutex::new(HashSet::new()),
            sent: Mutex::new(Vec::new()),
        }
    }
}

impl FakeTransport {
    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::default()
        }
    }

    pub fn failing_for(recipients: &[&str]) -> Self {
        let transport = Self::default();
        for recipient in recipients {
            transport.fail_for(recipient);
        }
        transport
    }

    pub fn fail_for(&self, recipient: &str) {
        self.failing.lock().unwrap().insert(recipient.to_string());
    }

    pub fn recover(&self, recipient: &str) {
        self.failing.lock().unwrap().remove(recipient);
    }

    /// Successfully delivered messages, in order.
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for FakeTransport {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn send(&self, email: &OutboundEmail) -> Result<(), TransportError> {
        if self.failing.lock().unwrap().contains(&email.to) {
            return Err(TransportError::Smtp(
                "550 mailbox unavailable".to_string(),
            ));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// State
// ────────────────────────────────────────────────────────────────────────────

/// Fakes wired into an `AppState`, kept as concrete handles for assertions.
pub struct TestServices {
    pub store: Arc<MemoryStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub generator: Arc<FakeGenerator>,
    pub transport: Arc<FakeTransport>,
}

impl TestServices {
    pub fn new(generator: FakeGenerator, transport: FakeTransport) -> Self {
        Self {
            store: Arc::new(MemoryStore::default()),
            blobs: Arc::new(MemoryBlobStore::default()),
            generator: Arc::new(generator),
            transport: Arc::new(transport),
        }
    }

    pub fn state(&self) -> AppState {
        AppState {
            profiles: self.store.clone(),
            requests: self.store.clone(),
            history: self.store.clone(),
            blobs: self.blobs.clone(),
            generator: self.generator.clone(),
            transport: self.transport.clone(),
        }
    }
}

/// Default wiring: unavailable generator, working transport.
pub fn test_state() -> (AppState, Arc<MemoryStore>, Arc<FakeTransport>) {
    let services = TestServices::new(FakeGenerator::failing(), FakeTransport::default());
    (
        services.state(),
        services.store.clone(),
        services.transport.clone(),
    )
}
