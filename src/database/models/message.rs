use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Incoming,
    Outgoing,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Incoming => "incoming",
            MessageType::Outgoing => "outgoing",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "incoming" => Some(MessageType::Incoming),
            "outgoing" => Some(MessageType::Outgoing),
            _ => None,
        }
    }
}

/// One row of the append-only WhatsApp message log.
///
/// The log reads back ordered by `created_at`, then by insertion: the table
/// carries a `seq bigserial` column that is never exposed but orders rows
/// sharing a timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    /// Counterparty phone number, incoming or outgoing
    pub from_number: String,
    pub customer_name: Option<String>,
    pub message_text: String,
    pub message_type: MessageType,
    pub is_read: bool,
    pub whatsapp_message_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn is_unread_incoming(&self) -> bool {
        self.message_type == MessageType::Incoming && !self.is_read
    }
}

/// Insert payload; `id` is assigned by the store and `created_at` defaults to now.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub from_number: String,
    pub customer_name: Option<String>,
    pub message_text: String,
    pub message_type: MessageType,
    pub is_read: bool,
    pub whatsapp_message_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl NewMessage {
    pub fn incoming(
        from_number: impl Into<String>,
        customer_name: Option<String>,
        message_text: impl Into<String>,
    ) -> Self {
        Self {
            from_number: from_number.into(),
            customer_name,
            message_text: message_text.into(),
            message_type: MessageType::Incoming,
            is_read: false,
            whatsapp_message_id: None,
            created_at: None,
        }
    }

    /// Replies are recorded against the recipient's number so they group with
    /// the customer's own messages.
    pub fn outgoing(to: impl Into<String>, message_text: impl Into<String>) -> Self {
        Self {
            from_number: to.into(),
            customer_name: None,
            message_text: message_text.into(),
            message_type: MessageType::Outgoing,
            is_read: true,
            whatsapp_message_id: None,
            created_at: None,
        }
    }

    pub fn with_provider_id(mut self, id: impl Into<String>) -> Self {
        self.whatsapp_message_id = Some(id.into());
        self
    }

    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}
