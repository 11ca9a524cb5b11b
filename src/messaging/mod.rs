//! Outbound WhatsApp transport and inbound webhook payloads.

pub mod webhook;
pub mod whatsapp;

use async_trait::async_trait;
use thiserror::Error;

pub use whatsapp::WhatsAppClient;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("messaging transport not configured: {0}")]
    NotConfigured(&'static str),

    #[error("provider rejected message ({status}): {reason}")]
    Rejected { status: u16, reason: String },

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Provider acknowledgement of an accepted message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub message_id: String,
}

#[async_trait]
pub trait MessagingTransport: Send + Sync {
    /// Send a text message to a normalised phone number
    async fn send(&self, to: &str, text: &str) -> Result<SendReceipt, TransportError>;
}

/// Stand-in used when the provider credentials are absent. Every send fails
/// with [`TransportError::NotConfigured`] naming the missing setting.
#[derive(Debug, Clone, Copy)]
pub struct DisabledTransport {
    missing: &'static str,
}

impl DisabledTransport {
    pub fn new(missing: &'static str) -> Self {
        Self { missing }
    }
}

#[async_trait]
impl MessagingTransport for DisabledTransport {
    async fn send(&self, _to: &str, _text: &str) -> Result<SendReceipt, TransportError> {
        Err(TransportError::NotConfigured(self.missing))
    }
}

/// Reduce a user-entered phone number to bare E.164 digits.
///
/// Spaces, dashes, dots, parentheses and one leading `+` are dropped; the
/// remainder must be 7 to 15 ASCII digits.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);

    let digits: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();

    if (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit()) {
        Some(digits)
    } else {
        None
    }
}
