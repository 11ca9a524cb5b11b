pub mod auth;
pub mod config;
pub mod conversation;
pub mod database;
pub mod error;
pub mod handlers;
pub mod hashing;
pub mod messaging;
pub mod middleware;
pub mod state;
pub mod theme;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::state::AppState;

/// Build the full router over an assembled state
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);

    Router::new()
        // Public
        .route("/", get(handlers::public::health::root))
        .route("/health", get(handlers::public::health::health))
        .merge(public_routes())
        // Chat console
        .merge(message_routes())
        // Session required
        .merge(protected_routes(state.clone()))
        // Global middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    use handlers::public::{auth, webhook};

    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route(
            "/api/whatsapp/webhook",
            get(webhook::verify).post(webhook::receive),
        )
}

fn message_routes() -> Router<AppState> {
    use handlers::messages;

    Router::new()
        .route("/api/messages", get(messages::list_messages))
        .route("/api/messages/send", post(messages::send_message))
        .route("/api/messages/read", post(messages::mark_read))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use handlers::protected::{profile, theme};

    Router::new()
        .route("/api/profile", get(profile::get_profile))
        .route("/api/themes/activate", post(theme::activate_theme))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::require_session,
        ))
}

/// Explicit origins when configured, permissive when CORS is on without a
/// list, and no CORS headers at all when disabled.
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
