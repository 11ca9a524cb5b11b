use async_trait::async_trait;
use axum::http::HeaderMap;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Claims carried by session tokens issued by the identity provider.
/// `sub` is the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Authenticated session resolved from a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user: SessionUser,
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Self {
            user: SessionUser {
                id: claims.sub,
                email: claims.email,
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    MissingSecret,
}

/// Resolves the caller's session from request headers. `Ok(None)` means the
/// request carries no valid session.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<Session>, AuthError>;
}

/// Verifies HS256 bearer tokens signed with a shared secret
pub struct JwtIdentityProvider {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityProvider {
    pub fn new(secret: &str) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::MissingSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Provider tokens carry an audience we do not pin
        validation.validate_aud = false;

        Ok(Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    fn validate(&self, token: &str) -> Result<Claims, String> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| format!("Invalid JWT token: {}", e))
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<Session>, AuthError> {
        let token = match extract_bearer_token(headers) {
            Ok(token) => token,
            Err(msg) => {
                tracing::debug!("No session: {}", msg);
                return Ok(None);
            }
        };

        match self.validate(token) {
            Ok(claims) => Ok(Some(Session::from(claims))),
            Err(msg) => {
                tracing::warn!("Rejected session token: {}", msg);
                Ok(None)
            }
        }
    }
}

/// Extract JWT token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or("Missing Authorization header")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        Some(_) => Err("Empty JWT token"),
        None => Err("Authorization header must use Bearer token format"),
    }
}
