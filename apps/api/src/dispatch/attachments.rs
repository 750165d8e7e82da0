//! Resolves the binary attachments for a send.
//!
//! Each attachment is resolved on its own. A missing resume or a failed
//! cover-letter render is logged and left out; it never fails the send.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::cover_letter::{cover_letter_filename, render_cover_letter, CoverLetterDetails};
use crate::dispatch::transport::EmailAttachment;
use crate::generation::generator::JobPosting;
use crate::models::profile::Profile;
use crate::store::blob::{file_name_of, guess_mime_type};
use crate::store::BlobStore;

/// Job and overrides for the generated cover letter.
#[derive(Debug, Clone)]
pub struct CoverLetterSpec {
    pub job: JobPosting,
    pub details: CoverLetterDetails,
}

#[derive(Debug, Clone, Default)]
pub struct ResolvedAttachments {
    pub resume: Option<EmailAttachment>,
    pub cover_letter: Option<EmailAttachment>,
}

impl ResolvedAttachments {
    pub fn resume_attached(&self) -> bool {
        self.resume.is_some()
    }

    pub fn cover_letter_attached(&self) -> bool {
        self.cover_letter.is_some()
    }

    /// Human-readable names of what actually got attached, resume first.
    pub fn labels(&self) -> Vec<&'static str> {
        let mut labels = Vec::new();
        if self.resume_attached() {
            labels.push("Resume");
        }
        if self.cover_letter_attached() {
            labels.push("Cover Letter");
        }
        labels
    }

    pub fn into_vec(self) -> Vec<EmailAttachment> {
        self.resume.into_iter().chain(self.cover_letter).collect()
    }
}

pub async fn resolve_attachments(
    blobs: &dyn BlobStore,
    profile: &Profile,
    cover_letter: Option<CoverLetterSpec>,
    date: NaiveDate,
) -> ResolvedAttachments {
    let resume = resolve_resume(blobs, profile).await;
    let cover_letter = match cover_letter {
        Some(spec) => resolve_cover_letter(profile, spec, date).await,
        None => None,
    };
    ResolvedAttachments {
        resume,
        cover_letter,
    }
}

async fn resolve_resume(blobs: &dyn BlobStore, profile: &Profile) -> Option<EmailAttachment> {
    let Some(key) = profile.resume_key.as_deref() else {
        info!("Profile {} has no resume; sending without it", profile.id);
        return None;
    };

    match blobs.get(key).await {
        Ok(content) => {
            let filename = file_name_of(key).to_string();
            Some(EmailAttachment {
                mime_type: guess_mime_type(&filename).to_string(),
                filename,
                content: content.to_vec(),
            })
        }
        Err(e) => {
            warn!("Could not attach resume for profile {}: {e}", profile.id);
            None
        }
    }
}

async fn resolve_cover_letter(
    profile: &Profile,
    spec: CoverLetterSpec,
    date: NaiveDate,
) -> Option<EmailAttachment> {
    let filename = cover_letter_filename(&profile.name, &spec.job.company, &spec.job.role);
    let owned_profile = profile.clone();
    let rendered = tokio::task::spawn_blocking(move || {
        render_cover_letter(&owned_profile, &spec.job, &spec.details, date)
    })
    .await;

    match rendered {
        Ok(Ok(content)) => Some(EmailAttachment {
            filename,
            content,
            mime_type: "application/pdf".to_string(),
        }),
        Ok(Err(e)) => {
            warn!("Could not render cover letter for profile {}: {e}", profile.id);
            None
        }
        Err(e) => {
            warn!("Cover letter task for profile {} failed: {e}", profile.id);
            None
        }
    }
}
