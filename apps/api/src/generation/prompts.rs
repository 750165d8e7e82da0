// Prompt templates for application-email generation.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::generation::generator::{Applicant, JobPosting};
use crate::generation::text::{excerpt, fill_template, or_na, NOT_AVAILABLE};
use crate::llm_client::prompts::{EMAIL_FORMAT_INSTRUCTION, FACTUALITY_INSTRUCTION};
use crate::models::profile::{Education, Profile};

/// Character budget for the experience excerpt in the profile prompt.
pub const EXPERIENCE_EXCERPT_CHARS: usize = 200;
/// Character budget for the projects excerpt in the profile prompt.
pub const PROJECTS_EXCERPT_CHARS: usize = 150;

/// Minimal prompt used when only a name and skills were supplied.
pub const LEGACY_PROMPT_TEMPLATE: &str = "\
Write a professional job application email with the following details:

Applicant Name: {name}
Company: {company}
Position: {role}
Skills: {skills}
Job Description: {job_description}

Instructions:
1. Write a compelling subject line
2. Address the hiring manager professionally
3. Highlight the relevant skills for the position
4. Show enthusiasm for the company and the role
5. Keep it concise (200-300 words)
6. End with a professional closing and the applicant's name

{factuality}
{format}";

/// Profile-backed prompt. Field order is fixed.
pub const PROFILE_PROMPT_TEMPLATE: &str = "\
Write a professional job application email for this candidate.

CANDIDATE:
Name: {name}
Education: {education}
Key Skills: {key_skills}
Additional Skills: {additional_skills}
Experience: {experience}
Projects: {projects}
Portfolio: {portfolio}
LinkedIn: {linkedin}
GitHub: {github}

JOB DETAILS:
Company: {company}
Position: {role}
Job Description: {job_description}

Requirements:
- Professional subject line
- Brief introduction with name and education
- Two or three strengths that match the job
- Enthusiasm for the company
- Under 150 words, professional tone

{factuality}
{format}";

/// Renders the generation prompt for an applicant and a job. Pure.
pub fn build_prompt(applicant: &Applicant<'_>, job: &JobPosting) -> String {
    let job_description = job
        .job_description
        .as_deref()
        .map(|jd| or_na(Some(jd)))
        .unwrap_or(NOT_AVAILABLE);

    match applicant {
        Applicant::Adhoc { name, skills } => {
            let skills = skills.to_string();
            fill_template(
                LEGACY_PROMPT_TEMPLATE,
                &[
                    ("name", or_na(Some(*name))),
                    ("company", &job.company),
                    ("role", &job.role),
                    ("skills", or_na(Some(&skills))),
                    ("job_description", job_description),
                    ("factuality", FACTUALITY_INSTRUCTION),
                    ("format", EMAIL_FORMAT_INSTRUCTION),
                ],
            )
        }
        Applicant::Profile(profile) => build_profile_prompt(profile, job, job_description),
    }
}

fn build_profile_prompt(profile: &Profile, job: &JobPosting, job_description: &str) -> String {
    let education = education_summary(&profile.education);
    let key_skills = profile.skills.programming_languages.to_string();
    let additional_skills = profile.skills.additional().to_string();
    let experience = excerpt(&profile.professional_experience, EXPERIENCE_EXCERPT_CHARS);
    let projects = excerpt(&profile.projects, PROJECTS_EXCERPT_CHARS);

    fill_template(
        PROFILE_PROMPT_TEMPLATE,
        &[
            ("name", &profile.name),
            ("education", &education),
            ("key_skills", or_na(Some(&key_skills))),
            ("additional_skills", or_na(Some(&additional_skills))),
            ("experience", or_na(experience.as_deref())),
            ("projects", or_na(projects.as_deref())),
            ("portfolio", or_na(profile.links.portfolio_url.as_deref())),
            ("linkedin", or_na(profile.links.linkedin_url.as_deref())),
            ("github", or_na(profile.links.github_url.as_deref())),
            ("company", &job.company),
            ("role", &job.role),
            ("job_description", job_description),
            ("factuality", FACTUALITY_INSTRUCTION),
            ("format", EMAIL_FORMAT_INSTRUCTION),
        ],
    )
}

/// "{degree} in {field} from {institution} ({year})", or N/A when nothing is known.
pub fn education_summary(education: &Education) -> String {
    if education.degree.is_none() && education.field.is_none() && education.institution.is_none()
    {
        return NOT_AVAILABLE.to_string();
    }
    let mut summary = format!(
        "{} in {} from {}",
        or_na(education.degree.as_deref()),
        or_na(education.field.as_deref()),
        or_na(education.institution.as_deref()),
    );
    if let Some(year) = education.graduation_year {
        summary.push_str(&format!(" ({year})"));
    }
    summary
}
