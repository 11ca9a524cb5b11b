// handlers/public/auth/register.rs - POST /api/auth/register

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::database::NewUser;
use crate::error::ApiError;
use crate::handlers::json_body;
use crate::state::AppState;

use super::utils::validate_registration;

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    pub user: Option<Value>,
}

/// POST /api/auth/register - Create a storefront account
///
/// Expected Input:
/// ```json
/// { "email": "string", "password": "string (min 6)", "name": "string (optional)" }
/// ```
///
/// Input is validated before anything external is touched. The password is
/// hashed here and the store's `register_user` procedure performs the
/// duplicate check and insert. A failure it reports is a 400 carrying its
/// message; anything unexpected is a 500.
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let input = validate_registration(json_body(body)?, state.config.security.password_min_length)?;

    let password_hash = state.hasher.hash(&input.password).await?;

    let outcome = state
        .users
        .register_user(&NewUser {
            email: input.email.clone(),
            password_hash,
            name: input.name,
        })
        .await?;

    if !outcome.success {
        let reason = outcome
            .error
            .unwrap_or_else(|| "Registration failed".to_string());
        tracing::warn!("Registration rejected for {}: {}", input.email, reason);
        return Err(ApiError::bad_request(reason));
    }

    tracing::info!("Registered account for {}", input.email);

    Ok(Json(RegisterResponse {
        success: true,
        message: "Registration successful".to_string(),
        user: outcome.user,
    }))
}
