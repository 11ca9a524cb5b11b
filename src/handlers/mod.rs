// handlers/mod.rs - Handler tiers
//
// Public (no session) → Protected (session required, see middleware::require_session)
// Message handlers sit beside the tiers: they take no session, matching the
// chat console's existing contract.
pub mod messages;
pub mod protected;
pub mod public;

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::ApiError;

/// Unwrap a JSON body, turning extractor rejections into the API's error shape
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::warn!("Rejected request body: {}", rejection.body_text());
            Err(ApiError::bad_request("Invalid JSON body"))
        }
    }
}

/// Trimmed, non-empty string field
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
