//! Relational store seam.
//!
//! Handlers and the theme activation manager only see the traits below; the
//! process wires them to [`PgStore`] at startup and tests wire in-memory fakes.

pub mod models;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub use models::message::{Message, MessageType, NewMessage};
pub use models::profile::Profile;
pub use models::theme::Theme;
pub use models::user::{NewUser, RegistrationOutcome};
pub use postgres::PgStore;

/// Errors from the relational store
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Invalid schema name: {0}")]
    InvalidSchemaName(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Account creation, delegated to the `register_user` procedure which owns
/// duplicate checks and row creation in one transaction.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn register_user(&self, user: &NewUser) -> Result<RegistrationOutcome, DatabaseError>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>, DatabaseError>;
}

/// Row-level theme operations. Ordering of `deactivate_all` and `activate` is
/// the caller's responsibility, see [`crate::theme::ThemeActivationManager`].
#[async_trait]
pub trait ThemeStore: Send + Sync {
    async fn theme_exists(&self, id: Uuid) -> Result<bool, DatabaseError>;

    /// Number of themes with `is_active = true`
    async fn active_count(&self) -> Result<u64, DatabaseError>;

    /// Set `is_active = false` on every theme row. Returns rows touched.
    async fn deactivate_all(&self) -> Result<u64, DatabaseError>;

    /// Set `is_active = true` on the matching row. Returns rows touched.
    async fn activate(&self, id: Uuid) -> Result<u64, DatabaseError>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Messages ordered by `created_at` ascending, optionally limited to one sender.
    async fn list_messages(&self, phone: Option<&str>) -> Result<Vec<Message>, DatabaseError>;

    async fn insert_message(&self, message: &NewMessage) -> Result<Message, DatabaseError>;

    /// Mark every unread incoming message from `phone` as read. Returns rows touched.
    async fn mark_read(&self, phone: &str) -> Result<u64, DatabaseError>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<(), DatabaseError>;
}
