// handlers/messages.rs - WhatsApp chat console endpoints

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::conversation::{self, Conversation};
use crate::database::{Message, NewMessage};
use crate::error::ApiError;
use crate::handlers::{json_body, non_empty};
use crate::messaging::normalize_phone;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageListResponse {
    pub messages: Vec<Message>,
    pub conversations: Vec<Conversation>,
    /// Set when the log could not be read and the lists are empty because of it
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub to: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub success: bool,
    pub message_id: String,
}

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub phone: Option<String>,
}

/// Stored numbers are bare digits; accept formatted input but fall back to
/// the raw value so odd legacy rows stay reachable.
fn phone_filter(raw: Option<String>) -> Option<String> {
    non_empty(raw).map(|p| normalize_phone(&p).unwrap_or(p))
}

/// GET /api/messages[?phone=] - message log plus per-contact conversations
///
/// Never fails: an unreadable log yields empty lists with `degraded: true`.
pub async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<MessageListResponse> {
    let phone = phone_filter(query.phone);

    match conversation::load_messages(state.messages.as_ref(), phone.as_deref()).await {
        Ok(messages) => {
            let conversations = conversation::conversation_list(&messages);
            Json(MessageListResponse {
                messages,
                conversations,
                degraded: false,
            })
        }
        Err(degraded) => {
            tracing::debug!("Serving degraded message list: {}", degraded.reason);
            Json(MessageListResponse {
                messages: Vec::new(),
                conversations: Vec::new(),
                degraded: true,
            })
        }
    }
}

/// POST /api/messages/send - send a WhatsApp text and log it
///
/// Expected Input:
/// ```json
/// { "to": "phone number", "message": "text" }
/// ```
///
/// Logging the sent message is best effort; the caller sees success as soon
/// as the provider accepts the message.
pub async fn send_message(
    State(state): State<AppState>,
    body: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<SendResponse>, ApiError> {
    let request = json_body(body)?;

    let (Some(raw_to), Some(text)) = (non_empty(request.to), non_empty(request.message)) else {
        return Err(ApiError::validation_error("Both 'to' and 'message' are required", None));
    };
    let to = normalize_phone(&raw_to).ok_or_else(|| ApiError::field("to", "Invalid phone number"))?;

    let receipt = state.transport.send(&to, &text).await?;
    tracing::info!("Sent WhatsApp message {} to {}", receipt.message_id, to);

    let record = NewMessage::outgoing(&to, &text).with_provider_id(&receipt.message_id);
    if let Err(e) = state.messages.insert_message(&record).await {
        tracing::warn!(
            "Message {} was sent but could not be logged: {}",
            receipt.message_id,
            e
        );
    }

    Ok(Json(SendResponse {
        success: true,
        message_id: receipt.message_id,
    }))
}

/// POST /api/messages/read - mark a contact's incoming messages as read
pub async fn mark_read(
    State(state): State<AppState>,
    body: Result<Json<MarkReadRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request = json_body(body)?;
    let phone = phone_filter(request.phone).ok_or_else(|| ApiError::field("phone", "Phone is required"))?;

    let updated = state.messages.mark_read(&phone).await?;
    tracing::debug!("Marked {} message(s) from {} as read", updated, phone);

    Ok(Json(json!({ "success": true, "updated": updated })))
}
