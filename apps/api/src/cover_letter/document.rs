//! Structured cover letter: ordered sections of styled paragraphs.
//!
//! Section order is fixed regardless of which details are supplied:
//! header → date → recipient → subject → greeting → introduction →
//! experience → interest → closing → signature.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::cover_letter::RenderError;
use crate::generation::generator::JobPosting;
use crate::generation::text::excerpt;
use crate::models::profile::{non_empty, Profile};

/// Budget for override achievement text.
pub const ACHIEVEMENTS_CHARS: usize = 150;
/// Budget for the profile experience excerpt when no overrides are given.
pub const PROFILE_EXPERIENCE_CHARS: usize = 120;

const DEFAULT_RECIPIENT: &str = "Hiring Manager";
const DEFAULT_SKILLS: &str = "software development";
const DEFAULT_QUALITIES: &str = "technical skills and passion";

const CLOSING_TEXT: &str = "Please find my resume attached for your review. I would welcome the \
    opportunity to discuss how my background fits your needs. Thank you for considering my \
    application.";

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Optional per-letter details. Blank values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CoverLetterDetails {
    pub recipient_name: Option<String>,
    pub company_address: Option<String>,
    pub company_city_state_zip: Option<String>,
    pub previous_company: Option<String>,
    pub key_skills: Option<String>,
    pub specific_achievements: Option<String>,
    pub company_interest: Option<String>,
    pub personal_qualities: Option<String>,
}

impl CoverLetterDetails {
    pub fn normalized(self) -> Self {
        Self {
            recipient_name: non_empty(self.recipient_name),
            company_address: non_empty(self.company_address),
            company_city_state_zip: non_empty(self.company_city_state_zip),
            previous_company: non_empty(self.previous_company),
            key_skills: non_empty(self.key_skills),
            specific_achievements: non_empty(self.specific_achievements),
            company_interest: non_empty(self.company_interest),
            personal_qualities: non_empty(self.personal_qualities),
        }
    }

    fn has_experience_overrides(&self) -> bool {
        self.previous_company.is_some()
            || self.key_skills.is_some()
            || self.specific_achievements.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphStyle {
    /// 16pt bold, centered.
    Title,
    /// 14pt bold.
    Heading,
    /// 10pt regular.
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Header,
    Date,
    Recipient,
    Subject,
    Greeting,
    Introduction,
    Experience,
    Interest,
    Closing,
    Signature,
}

/// One styled paragraph. Each entry of `lines` starts on a new line and is
/// word-wrapped independently; an empty entry is a blank line.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub style: ParagraphStyle,
    pub lines: Vec<String>,
}

impl Paragraph {
    fn normal(lines: Vec<String>) -> Self {
        Self {
            style: ParagraphStyle::Normal,
            lines,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub kind: SectionKind,
    pub paragraphs: Vec<Paragraph>,
    /// Extra vertical space after the section, in points.
    pub spacing_after_pt: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoverLetter {
    pub sections: Vec<Section>,
}

impl CoverLetter {
    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    /// Every text line in document order, before wrapping.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.sections
            .iter()
            .flat_map(|s| s.paragraphs.iter())
            .flat_map(|p| p.lines.iter().map(String::as_str))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Assembly
// ────────────────────────────────────────────────────────────────────────────

pub fn build_cover_letter(
    profile: &Profile,
    job: &JobPosting,
    details: &CoverLetterDetails,
    date: NaiveDate,
) -> Result<CoverLetter, RenderError> {
    let name = profile.name.trim();
    if name.is_empty() {
        return Err(RenderError::MissingField("name"));
    }
    let company = job.company.as_str();
    let role = job.role.as_str();
    let recipient = details.recipient_name.as_deref().unwrap_or(DEFAULT_RECIPIENT);

    let mut contact = vec![
        profile.location.clone(),
        profile.primary_email.clone(),
        profile.phone_number.clone(),
    ];
    let links = &profile.links;
    for (label, url) in [
        ("LinkedIn", &links.linkedin_url),
        ("GitHub", &links.github_url),
        ("Portfolio", &links.portfolio_url),
    ] {
        if let Some(url) = url {
            contact.push(format!("{label}: {url}"));
        }
    }

    let mut recipient_block = vec![recipient.to_string(), company.to_string()];
    recipient_block.extend(details.company_address.clone());
    recipient_block.extend(details.company_city_state_zip.clone());

    let sections = vec![
        Section {
            kind: SectionKind::Header,
            paragraphs: vec![
                Paragraph {
                    style: ParagraphStyle::Title,
                    lines: vec![name.to_string()],
                },
                Paragraph::normal(contact),
            ],
            spacing_after_pt: 15.0,
        },
        Section {
            kind: SectionKind::Date,
            paragraphs: vec![Paragraph::normal(vec![format_letter_date(date)])],
            spacing_after_pt: 10.0,
        },
        Section {
            kind: SectionKind::Recipient,
            paragraphs: vec![Paragraph::normal(recipient_block)],
            spacing_after_pt: 10.0,
        },
        Section {
            kind: SectionKind::Subject,
            paragraphs: vec![Paragraph {
                style: ParagraphStyle::Heading,
                lines: vec![format!("Subject: Application for the Position of {role}")],
            }],
            spacing_after_pt: 8.0,
        },
        body_section(SectionKind::Greeting, format!("Dear {recipient},")),
        body_section(SectionKind::Introduction, introduction(profile, job)),
        body_section(SectionKind::Experience, experience(profile, job, details)),
        body_section(SectionKind::Interest, interest(job, details)),
        Section {
            kind: SectionKind::Closing,
            paragraphs: vec![Paragraph::normal(vec![CLOSING_TEXT.to_string()])],
            spacing_after_pt: 12.0,
        },
        Section {
            kind: SectionKind::Signature,
            paragraphs: vec![Paragraph::normal(vec![
                "Sincerely,".to_string(),
                String::new(),
                name.to_string(),
            ])],
            spacing_after_pt: 0.0,
        },
    ];

    Ok(CoverLetter { sections })
}

fn body_section(kind: SectionKind, text: String) -> Section {
    Section {
        kind,
        paragraphs: vec![Paragraph::normal(vec![text])],
        spacing_after_pt: 6.0,
    }
}

/// "October 5, 2026".
pub fn format_letter_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

fn introduction(profile: &Profile, job: &JobPosting) -> String {
    let background = profile
        .education
        .field
        .as_deref()
        .unwrap_or(DEFAULT_SKILLS);
    format!(
        "I am writing to express my interest in the {} position at {}. With my background in \
         {background}, I am confident in my ability to contribute effectively to your team.",
        job.role, job.company
    )
}

fn experience(profile: &Profile, job: &JobPosting, details: &CoverLetterDetails) -> String {
    let profile_skills = profile.skills.programming_languages.to_string();
    let profile_skills = if profile_skills.is_empty() {
        DEFAULT_SKILLS.to_string()
    } else {
        profile_skills
    };

    let mut sentences = Vec::new();
    if details.has_experience_overrides() {
        let previous = details
            .previous_company
            .as_deref()
            .unwrap_or("my previous role");
        let skills = details.key_skills.as_deref().unwrap_or(&profile_skills);
        sentences.push(format!(
            "In my previous role at {previous}, I developed strong skills in {skills}."
        ));
        sentences.extend(
            details
                .specific_achievements
                .as_deref()
                .and_then(|a| excerpt(a, ACHIEVEMENTS_CHARS)),
        );
        sentences.push(format!(
            "I am enthusiastic about bringing my expertise to support {}'s goals.",
            job.company
        ));
    } else {
        sentences.push(format!(
            "In my professional experience, I developed strong skills in {profile_skills}."
        ));
        sentences.extend(excerpt(
            &profile.professional_experience,
            PROFILE_EXPERIENCE_CHARS,
        ));
        sentences.push(format!(
            "I am enthusiastic about contributing to {}'s success.",
            job.company
        ));
    }
    sentences.join(" ")
}

fn interest(job: &JobPosting, details: &CoverLetterDetails) -> String {
    let hook = match &details.company_interest {
        Some(interest) => interest.clone(),
        None => format!(
            "the chance to contribute to {}'s innovative projects",
            job.company
        ),
    };
    let qualities = details
        .personal_qualities
        .as_deref()
        .unwrap_or(DEFAULT_QUALITIES);
    format!(
        "What excites me most about this opportunity is {hook}. I am eager to bring my \
         {qualities} to your organization."
    )
}

/// `cover_letter_{name}_{company}_{role}.pdf`: spaces become underscores;
/// periods, commas and characters unsafe in a header or path are dropped.
pub fn cover_letter_filename(name: &str, company: &str, role: &str) -> String {
    fn clean(part: &str) -> String {
        part.trim()
            .chars()
            .filter_map(|c| match c {
                ' ' => Some('_'),
                '.' | ',' | '"' | '\'' | '/' | '\\' | ';' | ':' => None,
                c if c.is_control() => None,
                c => Some(c),
            })
            .collect()
    }
    format!(
        "cover_letter_{}_{}_{}.pdf",
        clean(name),
        clean(company),
        clean(role)
    )
}
