use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup aborts if a required variable is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub s3_region: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub gemini: GeminiConfig,
    pub smtp: SmtpConfig,
    pub port: u16,
    pub rust_log: String,
}

/// Settings handed to the text-generation adapter at construction.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// `None` disables remote generation; every request degrades to the template.
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
            api_base: "https://generativelanguage.googleapis.com".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    StartTls,
    Tls,
    None,
}

impl SmtpSecurity {
    /// Submission port when `SMTP_PORT` is unset; implicit TLS listens on 465.
    pub fn default_port(self) -> u16 {
        match self {
            SmtpSecurity::Tls => 465,
            SmtpSecurity::StartTls | SmtpSecurity::None => 587,
        }
    }
}

/// Settings for the outbound mail relay.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub security: SmtpSecurity,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Process-wide sender address for every outbound message.
    pub from_address: String,
}

impl SmtpConfig {
    /// A relay without credentials is treated as misconfigured; sends are refused up front.
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let gemini_defaults = GeminiConfig::default();
        let gemini = GeminiConfig {
            api_key: optional_env("GEMINI_API_KEY"),
            model: optional_env("GEMINI_MODEL").unwrap_or(gemini_defaults.model),
            api_base: optional_env("GEMINI_API_BASE").unwrap_or(gemini_defaults.api_base),
            timeout: match optional_env("GEMINI_TIMEOUT_SECS") {
                Some(secs) => Duration::from_secs(
                    secs.parse::<u64>()
                        .context("GEMINI_TIMEOUT_SECS must be a whole number of seconds")?,
                ),
                None => gemini_defaults.timeout,
            },
        };

        let username = optional_env("SMTP_USER");
        let security = parse_security(optional_env("SMTP_TLS").as_deref())?;
        let smtp = SmtpConfig {
            host: optional_env("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
            port: match optional_env("SMTP_PORT") {
                Some(port) => port
                    .parse::<u16>()
                    .context("SMTP_PORT must be a valid port number")?,
                None => security.default_port(),
            },
            security,
            from_address: optional_env("DEFAULT_FROM_EMAIL")
                .or_else(|| username.clone())
                .unwrap_or_else(|| "noreply@localhost".to_string()),
            password: optional_env("SMTP_PASSWORD"),
            username,
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            s3_region: optional_env("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            gemini,
            smtp,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Reads an optional variable; empty values count as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_security(raw: Option<&str>) -> Result<SmtpSecurity> {
    match raw.map(str::to_ascii_lowercase).as_deref() {
        None | Some("starttls") => Ok(SmtpSecurity::StartTls),
        Some("tls") => Ok(SmtpSecurity::Tls),
        Some("none") => Ok(SmtpSecurity::None),
        Some(other) => anyhow::bail!("SMTP_TLS must be one of starttls, tls, none (got '{other}')"),
    }
}
