//! Reply payloads
//!
//! Every command produces exactly one reply payload. The gateway owns the
//! actual rendering (embeds, colors) and expiry enforcement; the controller
//! only supplies content plus an expiry hint.

use serde::{Deserialize, Serialize};

/// Expiry hint for ephemeral error replies (seconds).
pub const EXPIRY_ERROR_SECS: u64 = 15;
/// Expiry hint for ping replies.
pub const EXPIRY_PING_SECS: u64 = 60;
/// Expiry hint for confirmations and now-playing views.
pub const EXPIRY_CONFIRM_SECS: u64 = 120;
/// Expiry hint for queue listings.
pub const EXPIRY_QUEUE_SECS: u64 = 3600;

/// One named field within a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyField {
    pub name: String,
    pub value: String,
}

/// Structured reply payload delivered back into chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    /// Optional headline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Optional body text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// Itemized fields, rendered in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<ReplyField>,

    /// Seconds the gateway should keep the message before deleting it.
    /// None means the message is left in place.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in_secs: Option<u64>,
}

impl Reply {
    /// Reply with a headline and an expiry hint.
    pub fn titled(title: impl Into<String>, expires_in_secs: Option<u64>) -> Self {
        Self {
            title: Some(title.into()),
            body: None,
            fields: Vec::new(),
            expires_in_secs,
        }
    }

    /// Short-lived informational reply (errors, leave confirmations).
    pub fn ephemeral(body: impl Into<String>) -> Self {
        Self {
            title: None,
            body: Some(body.into()),
            fields: Vec::new(),
            expires_in_secs: Some(EXPIRY_ERROR_SECS),
        }
    }

    /// Short-lived error reply.
    pub fn error(body: impl Into<String>) -> Self {
        Self::ephemeral(body)
    }

    /// Plain acknowledgement that stays in place (pause/resume/loop).
    pub fn note(body: impl Into<String>) -> Self {
        Self {
            title: None,
            body: Some(body.into()),
            fields: Vec::new(),
            expires_in_secs: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(ReplyField {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}
