//! Outbound mail seam and its SMTP implementation.
//!
//! One `send` call is one transport attempt; nothing here retries.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::info;

use crate::config::{SmtpConfig, SmtpSecurity};

#[derive(Debug, Clone, PartialEq)]
pub struct EmailAttachment {
    pub filename: String,
    pub content: Vec<u8>,
    pub mime_type: String,
}

/// A fully resolved message. The sender is the transport's configured default.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<EmailAttachment>,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("mail transport is not configured")]
    NotConfigured,

    #[error("invalid address '{0}'")]
    Address(String),

    #[error("could not build message: {0}")]
    Message(String),

    #[error("{0}")]
    Smtp(String),
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    /// False when credentials are missing; callers refuse to send up front.
    fn is_configured(&self) -> bool;

    async fn send(&self, email: &OutboundEmail) -> Result<(), TransportError>;
}

/// SMTP relay client built from [`SmtpConfig`].
pub struct SmtpMailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let from: Mailbox = config
            .from_address
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid DEFAULT_FROM_EMAIL '{}': {e}", config.from_address))?;

        let transport = match (&config.username, &config.password) {
            (Some(user), Some(password)) => {
                let builder = match config.security {
                    SmtpSecurity::StartTls => {
                        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
                    }
                    SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?,
                    SmtpSecurity::None => {
                        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                    }
                };
                let transport = builder
                    .port(config.port)
                    .credentials(Credentials::new(user.clone(), password.clone()))
                    .build();
                info!(
                    "SMTP transport ready: {}:{} ({:?})",
                    config.host, config.port, config.security
                );
                Some(transport)
            }
            _ => None,
        };

        Ok(Self { transport, from })
    }
}

/// Builds the MIME message: plain text alone, or mixed multipart when attachments exist.
pub fn build_message(from: &Mailbox, email: &OutboundEmail) -> Result<Message, TransportError> {
    let to: Mailbox = email
        .to
        .parse()
        .map_err(|_| TransportError::Address(email.to.clone()))?;

    let builder = Message::builder()
        .from(from.clone())
        .to(to)
        .subject(email.subject.clone());

    let message = if email.attachments.is_empty() {
        builder
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
    } else {
        let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(email.body.clone()));
        for attachment in &email.attachments {
            let content_type = ContentType::parse(&attachment.mime_type)
                .map_err(|e| TransportError::Message(format!("{}: {e}", attachment.filename)))?;
            parts = parts.singlepart(
                Attachment::new(attachment.filename.clone())
                    .body(attachment.content.clone(), content_type),
            );
        }
        builder.multipart(parts)
    };

    message.map_err(|e| TransportError::Message(e.to_string()))
}

#[async_trait]
impl MailTransport for SmtpMailer {
    fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    async fn send(&self, email: &OutboundEmail) -> Result<(), TransportError> {
        let transport = self.transport.as_ref().ok_or(TransportError::NotConfigured)?;
        let message = build_message(&self.from, email)?;
        transport
            .send(message)
            .await
            .map_err(|e| TransportError::Smtp(e.to_string()))?;
        Ok(())
    }
}
