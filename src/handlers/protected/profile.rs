use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::auth::Session;
use crate::database::Profile;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: Profile,
}

/// GET /api/profile - profile row of the session's user
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = state
        .profiles
        .find_profile(session.user.id)
        .await?
        .ok_or_else(|| {
            tracing::debug!("No profile row for user {}", session.user.id);
            ApiError::not_found("Profile not found")
        })?;

    Ok(Json(ProfileResponse { profile }))
}
