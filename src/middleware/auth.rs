use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::state::AppState;

/// Resolve the caller's session and inject it into the request, or answer 401.
///
/// Handlers behind this layer take `Extension<Session>`.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session = state
        .identity
        .get_session(request.headers())
        .await
        .map_err(|e| {
            tracing::error!("Session lookup failed: {}", e);
            ApiError::internal_server_error("Failed to resolve session")
        })?
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

    tracing::debug!("Session resolved for user {}", session.user.id);
    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}
