use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Session;
use crate::error::ApiError;
use crate::handlers::{json_body, non_empty};
use crate::state::AppState;
use crate::theme::ThemeActivationManager;

#[derive(Debug, Deserialize)]
pub struct ActivateThemeRequest {
    pub id: Option<String>,
    /// Skip deactivation and only activate `id`, after a partial failure
    #[serde(default)]
    pub resume: bool,
}

/// POST /api/themes/activate - make one theme the only active one
///
/// Expected Input:
/// ```json
/// { "id": "theme uuid", "resume": false }
/// ```
///
/// A 500 with code `PARTIAL_ACTIVATION_FAILURE` means every theme is now
/// inactive; resend with `"resume": true` to finish. Resuming while any theme
/// is active is a 409.
pub async fn activate_theme(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    body: Result<Json<ActivateThemeRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request = json_body(body)?;

    let raw_id = non_empty(request.id).ok_or_else(|| ApiError::field("id", "Theme id is required"))?;
    // Ids are opaque to callers; one that cannot name a row is simply not found
    let theme_id = Uuid::parse_str(&raw_id).map_err(|_| {
        tracing::debug!("Theme id '{}' is not a UUID", raw_id);
        ApiError::not_found(format!("Theme '{}' not found", raw_id))
    })?;

    let manager = ThemeActivationManager::new(state.themes.as_ref());
    if request.resume {
        manager.resume(theme_id).await?;
    } else {
        manager.activate(theme_id).await?;
    }

    tracing::info!("User {} activated theme {}", session.user.id, theme_id);

    Ok(Json(json!({ "success": true })))
}
