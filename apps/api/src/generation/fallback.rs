//! Deterministic email template used whenever remote generation fails.
//!
//! Pure and infallible: identical inputs always produce identical bytes.

use crate::generation::generator::{Applicant, JobPosting};
use crate::generation::text::excerpt;
use crate::models::profile::Profile;

/// Character budget for the experience bullet in the profile template.
pub const FALLBACK_EXPERIENCE_CHARS: usize = 100;

pub fn render_fallback(applicant: &Applicant<'_>, job: &JobPosting) -> String {
    match applicant {
        Applicant::Adhoc { name, skills } => {
            let skills = if skills.is_empty() {
                "software development".to_string()
            } else {
                skills.to_string()
            };
            legacy_template(name.trim(), &skills, job)
        }
        Applicant::Profile(profile) => profile_template(profile, job),
    }
}

fn subject_line(job: &JobPosting) -> String {
    format!(
        "Subject: Application for {} Position at {}",
        job.role, job.company
    )
}

fn legacy_template(name: &str, skills: &str, job: &JobPosting) -> String {
    let company = &job.company;
    let role = &job.role;
    format!(
        "{subject}\n\
         \n\
         Dear Hiring Manager,\n\
         \n\
         I am writing to express my strong interest in the {role} position at {company}. \
         With my expertise in {skills}, I am confident that I would be a valuable addition to your team.\n\
         \n\
         I am particularly excited about the opportunity to contribute to innovative projects and work \
         alongside talented professionals at {company}. I would welcome the opportunity to discuss how \
         my skills and passion for technology can contribute to your team's success.\n\
         \n\
         Thank you for considering my application. I look forward to hearing from you soon.\n\
         \n\
         Best regards,\n\
         {name}",
        subject = subject_line(job),
    )
}

fn profile_template(profile: &Profile, job: &JobPosting) -> String {
    let company = &job.company;
    let role = &job.role;

    let mut out = subject_line(job);
    out.push_str("\n\nDear Hiring Manager,\n\n");
    out.push_str(&introduction(profile));
    out.push_str(&format!(
        " I am excited to apply for the {role} position at {company}.\n\n"
    ));

    let key_skills = if profile.skills.programming_languages.is_empty() {
        profile.skills.additional()
    } else {
        profile.skills.programming_languages.clone()
    };
    let mut bullets = Vec::new();
    if !key_skills.is_empty() {
        bullets.push(format!("• Strong skills in {key_skills}"));
    }
    if let Some(experience) = excerpt(&profile.professional_experience, FALLBACK_EXPERIENCE_CHARS) {
        bullets.push(format!("• {experience}"));
    }
    if !bullets.is_empty() {
        out.push_str("My key qualifications include:\n");
        out.push_str(&bullets.join("\n"));
        out.push_str("\n\n");
    }

    out.push_str(&format!(
        "I am passionate about contributing to {company}'s innovative projects and would love to \
         discuss how my skills can benefit your team.\n\n"
    ));
    out.push_str(&format!(
        "Best regards,\n{}\n{}\n{}",
        profile.name, profile.phone_number, profile.primary_email
    ));
    out
}

/// "I am {name}, a {degree} graduate in {field} from {institution}." with
/// absent education parts left out.
fn introduction(profile: &Profile) -> String {
    let education = &profile.education;
    if education.degree.is_none() && education.field.is_none() && education.institution.is_none()
    {
        return format!("I am {}.", profile.name);
    }

    let mut sentence = format!("I am {}, a ", profile.name);
    if let Some(degree) = &education.degree {
        sentence.push_str(degree);
        sentence.push(' ');
    }
    sentence.push_str("graduate");
    if let Some(field) = &education.field {
        sentence.push_str(&format!(" in {field}"));
    }
    if let Some(institution) = &education.institution {
        sentence.push_str(&format!(" from {institution}"));
    }
    sentence.push('.');
    sentence
}
