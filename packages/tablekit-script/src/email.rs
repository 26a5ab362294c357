//! Email collaborator.
//!
//! `sendEmail` inside a script only validates and queues a request. The
//! queue is handed to an [`EmailSender`] once the run has succeeded.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;

/// Message queued by a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRequest {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl EmailRequest {
    /// Validates a request as received from a script.
    ///
    /// # Returns
    /// The request, or the message reported back to the script.
    pub fn new(to: Vec<String>, subject: String, body: String) -> std::result::Result<Self, String> {
        if to.is_empty() {
            return Err("At least one recipient is required".to_string());
        }
        if to.iter().any(|address| address.trim().is_empty()) {
            return Err("Recipients must not be blank".to_string());
        }
        if subject.trim().is_empty() {
            return Err("Subject is required".to_string());
        }
        if body.trim().is_empty() {
            return Err("Body is required".to_string());
        }
        Ok(Self { to, subject, body })
    }

    /// Adds the sender address.
    pub fn into_message(self, from: &str) -> EmailMessage {
        EmailMessage {
            to: self.to,
            subject: self.subject,
            body: self.body,
            from: from.to_string(),
        }
    }
}

/// Message handed to the email collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    pub from: String,
}

/// Outgoing email transport.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Delivers one message.
    async fn send_email(&self, message: EmailMessage) -> Result<()>;
}

/// Sender that only logs messages.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEmailSender;

#[async_trait]
impl EmailSender for TracingEmailSender {
    async fn send_email(&self, message: EmailMessage) -> Result<()> {
        info!(
            "Email from {} to {}: {}",
            message.from,
            message.to.join(", "),
            message.subject
        );
        Ok(())
    }
}
