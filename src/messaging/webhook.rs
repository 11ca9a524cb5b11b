//! WhatsApp Cloud API webhook notifications.
//!
//! Only text messages become log entries; statuses, reactions and media are
//! skipped.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::database::NewMessage;

#[derive(Debug, Default, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub messages: Vec<InboundMessage>,
}

#[derive(Debug, Deserialize)]
pub struct Contact {
    pub wa_id: String,
    #[serde(default)]
    pub profile: Option<ContactProfile>,
}

#[derive(Debug, Deserialize)]
pub struct ContactProfile {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    pub from: String,
    pub id: String,
    /// Unix seconds, sent as a string
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<TextBody>,
}

#[derive(Debug, Deserialize)]
pub struct TextBody {
    pub body: String,
}

/// Query parameters of the subscription handshake (`hub.mode` etc.)
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

impl VerifyQuery {
    /// The challenge to echo back when this is a valid subscription request
    pub fn accept(&self, expected_token: &str) -> Option<&str> {
        if expected_token.is_empty() {
            return None;
        }
        match (&self.mode, &self.verify_token, &self.challenge) {
            (Some(mode), Some(token), Some(challenge))
                if mode == "subscribe" && token == expected_token =>
            {
                Some(challenge.as_str())
            }
            _ => None,
        }
    }
}

impl Notification {
    /// Flatten every text message into an incoming, unread log entry, named
    /// after the matching contact profile when one is present.
    pub fn incoming_messages(&self) -> Vec<NewMessage> {
        let mut out = Vec::new();

        for change in self.entry.iter().flat_map(|e| e.changes.iter()) {
            if change.field.as_deref().is_some_and(|f| f != "messages") {
                continue;
            }

            let names: HashMap<&str, &str> = change
                .value
                .contacts
                .iter()
                .filter_map(|c| {
                    let name = c.profile.as_ref()?.name.as_deref()?;
                    Some((c.wa_id.as_str(), name))
                })
                .collect();

            for message in &change.value.messages {
                let Some(text) = message.text.as_ref().filter(|_| message.kind == "text") else {
                    tracing::debug!("Skipping non-text webhook message {} ({})", message.id, message.kind);
                    continue;
                };

                let customer_name = names
                    .get(message.from.as_str())
                    .map(|n| n.to_string())
                    .filter(|n| !n.trim().is_empty());

                let mut entry = NewMessage::incoming(&message.from, customer_name, &text.body)
                    .with_provider_id(&message.id);
                if let Some(at) = message.timestamp.as_deref().and_then(parse_unix_seconds) {
                    entry = entry.at(at);
                }
                out.push(entry);
            }
        }

        out
    }
}

fn parse_unix_seconds(raw: &str) -> Option<DateTime<Utc>> {
    let secs: i64 = raw.parse().ok()?;
    Utc.timestamp_opt(secs, 0).single()
}
