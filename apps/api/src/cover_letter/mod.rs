//! Cover letter assembly (`document`) and PDF serialization (`pdf`).

pub mod document;
pub mod handlers;
pub mod pdf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::errors::AppError;
use crate::generation::generator::JobPosting;
use crate::layout::PageConfig;
use crate::models::profile::Profile;

pub use document::{build_cover_letter, cover_letter_filename, CoverLetterDetails};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("profile is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("PDF serialization failed: {0}")]
    Pdf(String),
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        AppError::Render(err.to_string())
    }
}

/// Builds the letter for `date` and serializes it to PDF bytes. CPU-bound.
pub fn render_cover_letter(
    profile: &Profile,
    job: &JobPosting,
    details: &CoverLetterDetails,
    date: NaiveDate,
) -> Result<Vec<u8>, RenderError> {
    let letter = build_cover_letter(profile, job, details, date)?;
    pdf::write_pdf(&letter, &PageConfig::a4_letter())
}
