//! Mail transport boundary.
//!
//! The transport is built once at startup and passed by handle to whoever
//! sends mail; nothing lazily instantiates a shared transporter.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outbound message handed to the mail provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Delivery receipt returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryInfo {
    pub message_id: String,
    pub scheduled: bool,
}

#[async_trait]
pub trait MailProvider: Send + Sync {
    async fn send(&self, message: MailMessage) -> anyhow::Result<DeliveryInfo>;
}

/// Records outbound mail instead of delivering it (development/test
/// transport).
#[derive(Debug, Default)]
pub struct RecordingMailProvider {
    sent: Mutex<Vec<MailMessage>>,
}

impl RecordingMailProvider {
    pub fn new() -> RecordingMailProvider {
        RecordingMailProvider::default()
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailProvider for RecordingMailProvider {
    async fn send(&self, message: MailMessage) -> anyhow::Result<DeliveryInfo> {
        tracing::debug!(to = %message.to, subject = %message.subject, "recording outbound mail");
        let scheduled = message.scheduled_at.is_some();
        self.sent.lock().unwrap().push(message);
        Ok(DeliveryInfo {
            message_id: uuid::Uuid::now_v7().to_string(),
            scheduled,
        })
    }
}
