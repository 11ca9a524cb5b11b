//! Per-contact conversation summaries derived from the message log.
//!
//! Nothing here is persisted; summaries are rebuilt from the log on every read.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::database::{DatabaseError, Message, MessageStore};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub phone_number: String,
    pub customer_name: Option<String>,
    pub last_message: String,
    pub last_message_time: DateTime<Utc>,
    pub unread_count: u32,
}

impl Conversation {
    fn start(message: &Message) -> Self {
        Self {
            phone_number: message.from_number.clone(),
            customer_name: message.customer_name.clone(),
            last_message: message.message_text.clone(),
            last_message_time: message.created_at,
            unread_count: 0,
        }
    }

    fn absorb(&mut self, message: &Message) {
        if message.created_at > self.last_message_time {
            self.customer_name = message.customer_name.clone();
            self.last_message = message.message_text.clone();
            self.last_message_time = message.created_at;
        }
        if message.is_unread_incoming() {
            self.unread_count += 1;
        }
    }
}

/// Group messages by sender number.
///
/// The newest message (strictly greater `created_at`; on ties the first one
/// seen stays) supplies name, text and time. `unread_count` sums unread
/// incoming messages across the whole group. Input order does not matter.
pub fn aggregate<'a, I>(messages: I) -> HashMap<String, Conversation>
where
    I: IntoIterator<Item = &'a Message>,
{
    let mut conversations: HashMap<String, Conversation> = HashMap::new();

    for message in messages {
        conversations
            .entry(message.from_number.clone())
            .or_insert_with(|| Conversation::start(message))
            .absorb(message);
    }

    conversations
}

/// Aggregate and order for display, most recent conversation first.
pub fn conversation_list<'a, I>(messages: I) -> Vec<Conversation>
where
    I: IntoIterator<Item = &'a Message>,
{
    let mut list: Vec<Conversation> = aggregate(messages).into_values().collect();
    list.sort_by(|a, b| {
        b.last_message_time
            .cmp(&a.last_message_time)
            .then_with(|| a.phone_number.cmp(&b.phone_number))
    });
    list
}

/// The message log could not be read. Callers answer with empty data and flag
/// the response instead of failing the request.
#[derive(Debug)]
pub struct Degraded {
    pub reason: DatabaseError,
}

/// Read the message log, absorbing store failures into [`Degraded`].
pub async fn load_messages(
    store: &dyn MessageStore,
    phone: Option<&str>,
) -> Result<Vec<Message>, Degraded> {
    store.list_messages(phone).await.map_err(|reason| {
        tracing::warn!("Message log unavailable, serving empty inbox: {}", reason);
        Degraded { reason }
    })
}
