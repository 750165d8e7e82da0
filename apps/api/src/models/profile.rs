use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::errors::AppError;

/// An ordered list of skills, parsed once from the comma-separated form.
///
/// The comma-joined string is only the storage/display format; duplicates
/// (case-insensitive) are dropped while keeping first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillList(Vec<String>);

impl SkillList {
    pub fn parse(raw: &str) -> Self {
        Self::from_items(raw.split(',').map(str::to_string))
    }

    pub fn from_items<I: IntoIterator<Item = String>>(items: I) -> Self {
        let mut out: Vec<String> = Vec::new();
        for item in items {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            if out.iter().any(|s| s.eq_ignore_ascii_case(item)) {
                continue;
            }
            out.push(item.to_string());
        }
        SkillList(out)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn items(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for SkillList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

impl Serialize for SkillList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SkillList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            List(Vec<String>),
        }

        // null is an empty category
        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Text(text)) => SkillList::parse(&text),
            Some(Raw::List(items)) => SkillList::from_items(items),
            None => SkillList::default(),
        })
    }
}

/// Skill categories captured on a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skills {
    pub programming_languages: SkillList,
    pub python_frameworks: SkillList,
    pub frontend_technologies: SkillList,
    pub mobile_development: SkillList,
    pub databases: SkillList,
    pub cloud_devops: SkillList,
    pub deployment_platforms: SkillList,
    pub integrations: SkillList,
    pub development_practices: SkillList,
}

impl Skills {
    /// Every category except programming languages, flattened in declaration order.
    pub fn additional(&self) -> SkillList {
        SkillList::from_items(
            [
                &self.python_frameworks,
                &self.frontend_technologies,
                &self.mobile_development,
                &self.databases,
                &self.cloud_devops,
                &self.deployment_platforms,
                &self.integrations,
                &self.development_practices,
            ]
            .into_iter()
            .flat_map(|list| list.items().iter().cloned()),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub degree: Option<String>,
    pub field: Option<String>,
    pub institution: Option<String>,
    pub graduation_year: Option<i32>,
    pub gpa: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileLinks {
    pub portfolio_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub leetcode_url: Option<String>,
}

/// A candidate profile. `name`, `location`, `phone_number` and `primary_email`
/// are always non-empty once a profile exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub phone_number: String,
    pub primary_email: String,
    pub alternative_email: Option<String>,
    pub links: ProfileLinks,
    pub education: Education,
    pub skills: Skills,
    pub professional_experience: String,
    pub projects: String,
    /// Blob-store key of the uploaded resume, if any.
    #[serde(skip)]
    pub resume_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn has_resume(&self) -> bool {
        self.resume_key.is_some()
    }
}

/// Validated input for the create-or-update entry point.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileInput {
    pub name: String,
    pub location: String,
    pub phone_number: String,
    pub primary_email: String,
    pub alternative_email: Option<String>,
    pub links: ProfileLinks,
    pub education: Education,
    pub skills: Skills,
    pub professional_experience: String,
    pub projects: String,
}

/// A number that may arrive as JSON number or as form text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberField {
    Number(f64),
    Text(String),
}

impl NumberField {
    fn to_f64(&self, field: &str) -> Result<Option<f64>, AppError> {
        match self {
            NumberField::Number(n) => Ok(Some(*n)),
            NumberField::Text(t) if t.trim().is_empty() => Ok(None),
            NumberField::Text(t) => t
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| AppError::Validation(format!("{field} must be a number"))),
        }
    }
}

/// Raw profile body as posted by clients (JSON or multipart text fields).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfilePayload {
    pub name: Option<String>,
    pub location: Option<String>,
    pub phone_number: Option<String>,
    pub primary_email: Option<String>,
    pub alternative_email: Option<String>,
    pub portfolio_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub leetcode_url: Option<String>,
    pub education_degree: Option<String>,
    pub education_field: Option<String>,
    pub university_name: Option<String>,
    pub graduation_year: Option<NumberField>,
    pub gpa: Option<NumberField>,
    #[serde(flatten)]
    pub skills: Skills,
    pub professional_experience: Option<String>,
    pub projects: Option<String>,
}

impl ProfilePayload {
    pub fn into_input(self) -> Result<ProfileInput, AppError> {
        let (name, location, phone_number, primary_email) = match (
            non_empty(self.name),
            non_empty(self.location),
            non_empty(self.phone_number),
            non_empty(self.primary_email),
        ) {
            (Some(n), Some(l), Some(p), Some(e)) => (n, l, p, e),
            _ => {
                return Err(AppError::Validation(
                    "Missing required fields: name, location, phone_number, primary_email"
                        .to_string(),
                ))
            }
        };

        let graduation_year = match &self.graduation_year {
            Some(raw) => match raw.to_f64("graduation_year")? {
                Some(y) if y.fract() == 0.0 && (1900.0..=2200.0).contains(&y) => Some(y as i32),
                Some(_) => {
                    return Err(AppError::Validation(
                        "graduation_year must be a four-digit year".to_string(),
                    ))
                }
                None => None,
            },
            None => None,
        };
        let gpa = match &self.gpa {
            Some(raw) => raw.to_f64("gpa")?,
            None => None,
        };

        Ok(ProfileInput {
            name,
            location,
            phone_number,
            primary_email: primary_email.to_ascii_lowercase(),
            alternative_email: non_empty(self.alternative_email),
            links: ProfileLinks {
                portfolio_url: non_empty(self.portfolio_url),
                linkedin_url: non_empty(self.linkedin_url),
                github_url: non_empty(self.github_url),
                leetcode_url: non_empty(self.leetcode_url),
            },
            education: Education {
                degree: non_empty(self.education_degree),
                field: non_empty(self.education_field),
                institution: non_empty(self.university_name),
                graduation_year,
                gpa,
            },
            skills: self.skills,
            professional_experience: self.professional_experience.unwrap_or_default(),
            projects: self.projects.unwrap_or_default(),
        })
    }
}

/// Trims and treats blank strings as absent.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A required request field: present and non-blank, or a validation error naming it.
pub fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    non_empty(value).ok_or_else(|| AppError::missing_field(field))
}
