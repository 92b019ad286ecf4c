//! Email transport contract and stand-in transports.

use async_trait::async_trait;
use log::info;
use std::sync::{Mutex, PoisonError};

/// One outbound email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailNotification {
    pub to: Vec<String>,
    pub subject: String,
    pub content: String,
    /// Attachment file names forwarded with the message.
    pub attachments: Vec<String>,
}

/// External email service boundary.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Sends `email`; returns whether the transport accepted it.
    async fn send(&self, email: &EmailNotification) -> bool;
}

/// Transport that only logs what would be sent. Always succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEmailTransport;

#[async_trait]
impl EmailTransport for LoggingEmailTransport {
    async fn send(&self, email: &EmailNotification) -> bool {
        info!(
            "event=email_send module=delivery status=ok recipients={} subject={:?} attachments={}",
            email.to.join(","),
            email.subject,
            email.attachments.len()
        );
        true
    }
}

/// Transport that records every message in memory.
#[derive(Debug, Default)]
pub struct OutboxEmailTransport {
    sent: Mutex<Vec<EmailNotification>>,
}

impl OutboxEmailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every recorded message in send order.
    pub fn sent(&self) -> Vec<EmailNotification> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl EmailTransport for OutboxEmailTransport {
    async fn send(&self, email: &EmailNotification) -> bool {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(email.clone());
        true
    }
}
