use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Outcome of a transport call.
///
/// Transitions: created → {sent | failed}; failed → sent and sent → failed only
/// through a resend of the same record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendStatus {
    Sent,
    Failed,
}

impl SendStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SendStatus::Sent => "sent",
            SendStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SendStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(SendStatus::Sent),
            "failed" => Ok(SendStatus::Failed),
            other => Err(format!("unknown send status '{other}'")),
        }
    }
}

/// History entry written once per dispatch attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentEmailRecord {
    pub id: Uuid,
    pub request_id: Option<Uuid>,
    pub recipient_email: String,
    pub subject: String,
    pub body: String,
    pub status: SendStatus,
    pub resume_attached: bool,
    pub sent_at: DateTime<Utc>,
}

/// Row shape of `sent_emails`; status is stored as text.
#[derive(Debug, Clone, FromRow)]
pub struct SentEmailRow {
    pub id: Uuid,
    pub request_id: Option<Uuid>,
    pub recipient_email: String,
    pub subject: String,
    pub body: String,
    pub status: String,
    pub resume_attached: bool,
    pub sent_at: DateTime<Utc>,
}

impl TryFrom<SentEmailRow> for SentEmailRecord {
    type Error = String;

    fn try_from(row: SentEmailRow) -> Result<Self, Self::Error> {
        Ok(SentEmailRecord {
            id: row.id,
            request_id: row.request_id,
            recipient_email: row.recipient_email,
            subject: row.subject,
            body: row.body,
            status: row.status.parse()?,
            resume_attached: row.resume_attached,
            sent_at: row.sent_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewSentEmail {
    pub request_id: Option<Uuid>,
    pub recipient_email: String,
    pub subject: String,
    pub body: String,
    pub status: SendStatus,
    pub resume_attached: bool,
}
