// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Outbound mail.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::MailError;

/// An outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html: String,
}

/// Sends mail.
#[async_trait]
pub trait MailSender: Send + Sync {
    /// Sends one message.
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError>;
}

// =============================================================================
// LogMailSender
// =============================================================================

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailSender;

#[async_trait]
impl MailSender for LogMailSender {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        tracing::info!(to = %to, subject = %subject, body = %html, "Mail dispatched to log");
        Ok(())
    }
}

// =============================================================================
// MemoryMailSender
// =============================================================================

/// Keeps every message in an outbox. Can be switched to fail.
#[derive(Debug, Default)]
pub struct MemoryMailSender {
    outbox: Mutex<Vec<MailMessage>>,
    failing: Mutex<bool>,
}

impl MemoryMailSender {
    /// Creates an empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent sends fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    /// Returns a copy of the sent messages.
    pub fn sent(&self) -> Vec<MailMessage> {
        self.outbox.lock().clone()
    }

    /// Returns the last message sent to `to`.
    pub fn last_to(&self, to: &str) -> Option<MailMessage> {
        self.outbox.lock().iter().rev().find(|m| m.to == to).cloned()
    }
}

#[async_trait]
impl MailSender for MemoryMailSender {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        if *self.failing.lock() {
            return Err(MailError::Transport("outbox unavailable".to_string()));
        }

        self.outbox.lock().push(MailMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_outbox() {
        let mail = MemoryMailSender::new();
        mail.send("a@example.com", "hi", "<p>1</p>").await.unwrap();
        mail.send("a@example.com", "hi", "<p>2</p>").await.unwrap();

        assert_eq!(mail.sent().len(), 2);
        assert_eq!(mail.last_to("a@example.com").unwrap().html, "<p>2</p>");
        assert!(mail.last_to("b@example.com").is_none());
    }

    #[tokio::test]
    async fn test_failing_sender() {
        let mail = MemoryMailSender::new();
        mail.set_failing(true);
        assert!(mail.send("a@example.com", "s", "b").await.is_err());
        assert!(mail.sent().is_empty());
    }
}
