// handlers/public/webhook.rs - WhatsApp Cloud API webhook

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::handlers::json_body;
use crate::messaging::webhook::{Notification, VerifyQuery};
use crate::state::AppState;

/// GET /api/whatsapp/webhook - subscription handshake
///
/// Echoes `hub.challenge` as plain text when `hub.verify_token` matches the
/// configured token.
pub async fn verify(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Result<String, ApiError> {
    match query.accept(&state.config.whatsapp.verify_token) {
        Some(challenge) => {
            tracing::info!("WhatsApp webhook subscription verified");
            Ok(challenge.to_string())
        }
        None => {
            tracing::warn!("WhatsApp webhook verification rejected (mode {:?})", query.mode);
            Err(ApiError::forbidden("Webhook verification failed"))
        }
    }
}

/// POST /api/whatsapp/webhook - inbound notifications
///
/// Each text message is appended to the log as incoming and unread. Store
/// failures are logged per message and the provider still gets a 200, since
/// a non-2xx makes it redeliver the whole batch.
pub async fn receive(
    State(state): State<AppState>,
    body: Result<Json<Notification>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let notification = json_body(body)?;
    let incoming = notification.incoming_messages();

    let mut received = 0usize;
    for message in &incoming {
        match state.messages.insert_message(message).await {
            Ok(stored) => {
                received += 1;
                tracing::debug!("Recorded incoming message {} from {}", stored.id, stored.from_number);
            }
            Err(e) => {
                tracing::error!(
                    "Failed to record incoming message {:?} from {}: {}",
                    message.whatsapp_message_id,
                    message.from_number,
                    e
                );
            }
        }
    }

    Ok(Json(json!({ "success": true, "received": received })))
}
