//! Notification queue message payloads.
//!
//! The backend only produces these messages; a separate worker consumes the
//! queue and does the actual delivery.

use serde::{Deserialize, Serialize};

/// An email to be delivered by the notification worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailNotification {
    pub to: String,
    pub title: String,
    pub text: String,
}

/// Envelope pushed onto the notification queue.
///
/// `kind` routes the payload on the consumer side; only "email" exists today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: EmailNotification,
}

impl QueueMessage {
    pub fn email(notification: EmailNotification) -> Self {
        Self {
            kind: "email".to_string(),
            payload: notification,
        }
    }
}
