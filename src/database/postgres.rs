use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::config::DatabaseConfig;

use super::{
    DatabaseError, Message, MessageStore, MessageType, NewMessage, NewUser, Profile,
    ProfileStore, RegistrationOutcome, StoreHealth, ThemeStore, UserStore,
};

const PROFILES_TABLE: &str = "profiles";
const THEMES_TABLE: &str = "themes";
const MESSAGES_TABLE: &str = "whatsapp_messages";
const REGISTER_PROCEDURE: &str = "register_user";

const MESSAGE_COLUMNS: &str =
    "id, from_number, customer_name, message_text, message_type, is_read, whatsapp_message_id, created_at";

/// Log order. `seq` is the table's `bigserial` insertion counter and breaks
/// `created_at` ties.
const MESSAGE_ORDER: &str = "ORDER BY created_at ASC, seq ASC";

/// Schema-scoped Postgres store backing every store trait.
///
/// Cloning is cheap; all clones share one pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    schema: String,
}

#[derive(Debug, FromRow)]
struct MessageRow {
    id: Uuid,
    from_number: String,
    customer_name: Option<String>,
    message_text: String,
    message_type: String,
    is_read: bool,
    whatsapp_message_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for Message {
    type Error = DatabaseError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let message_type = MessageType::parse(&row.message_type).ok_or_else(|| {
            DatabaseError::QueryError(format!(
                "unknown message_type '{}' on message {}",
                row.message_type, row.id
            ))
        })?;

        Ok(Message {
            id: row.id,
            from_number: row.from_number,
            customer_name: row.customer_name,
            message_text: row.message_text,
            message_type,
            is_read: row.is_read,
            whatsapp_message_id: row.whatsapp_message_id,
            created_at: row.created_at,
        })
    }
}

impl PgStore {
    /// Build a lazily-connecting pool. The process starts even while the
    /// database is unreachable; queries fail individually until it comes back.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
        url::Url::parse(url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;

        if !Self::is_valid_schema_name(&config.schema) {
            return Err(DatabaseError::InvalidSchemaName(config.schema.clone()));
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_lazy(url)?;

        info!("Created database pool for schema: {}", config.schema);
        Ok(Self::from_pool(pool, &config.schema))
    }

    pub fn from_pool(pool: PgPool, schema: &str) -> Self {
        Self {
            pool,
            schema: schema.to_string(),
        }
    }

    /// Close the pool on shutdown
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool for schema: {}", self.schema);
    }

    fn table(&self, name: &str) -> String {
        format!(
            "{}.{}",
            Self::quote_identifier(&self.schema),
            Self::quote_identifier(name)
        )
    }

    fn list_messages_sql(table: &str, by_phone: bool) -> String {
        let filter = if by_phone { " WHERE from_number = $1" } else { "" };
        format!("SELECT {} FROM {}{} {}", MESSAGE_COLUMNS, table, filter, MESSAGE_ORDER)
    }

    /// Quote SQL identifier to prevent injection
    fn quote_identifier(name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Schema names are plain identifiers: ASCII letters, digits and underscore,
    /// not starting with a digit.
    fn is_valid_schema_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn register_user(&self, user: &NewUser) -> Result<RegistrationOutcome, DatabaseError> {
        let sql = format!(
            "SELECT {}($1, $2, $3) AS result",
            self.table(REGISTER_PROCEDURE)
        );

        let row = sqlx::query(&sql)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.name)
            .fetch_one(&self.pool)
            .await?;

        let result: Value = row.try_get("result")?;
        serde_json::from_value(result).map_err(|e| {
            DatabaseError::QueryError(format!("unexpected {} result: {}", REGISTER_PROCEDURE, e))
        })
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>, DatabaseError> {
        let sql = format!(
            "SELECT row_to_json(t) AS row FROM (SELECT * FROM {} WHERE id = $1) t",
            self.table(PROFILES_TABLE)
        );

        let row = sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => match row.try_get::<Value, _>("row")? {
                Value::Object(map) => Ok(Some(Profile(map))),
                _ => Ok(None),
            },
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ThemeStore for PgStore {
    async fn theme_exists(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)",
            self.table(THEMES_TABLE)
        );
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn active_count(&self) -> Result<u64, DatabaseError> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE is_active",
            self.table(THEMES_TABLE)
        );
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }

    async fn deactivate_all(&self) -> Result<u64, DatabaseError> {
        let sql = format!("UPDATE {} SET is_active = false", self.table(THEMES_TABLE));
        let result = sqlx::query(&sql).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn activate(&self, id: Uuid) -> Result<u64, DatabaseError> {
        let sql = format!(
            "UPDATE {} SET is_active = true WHERE id = $1",
            self.table(THEMES_TABLE)
        );
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl MessageStore for PgStore {
    async fn list_messages(&self, phone: Option<&str>) -> Result<Vec<Message>, DatabaseError> {
        let sql = Self::list_messages_sql(&self.table(MESSAGES_TABLE), phone.is_some());
        let query = sqlx::query_as::<_, MessageRow>(&sql);
        let rows = match phone {
            Some(phone) => query.bind(phone).fetch_all(&self.pool).await?,
            None => query.fetch_all(&self.pool).await?,
        };

        rows.into_iter().map(Message::try_from).collect()
    }

    async fn insert_message(&self, message: &NewMessage) -> Result<Message, DatabaseError> {
        let sql = format!(
            "INSERT INTO {} (from_number, customer_name, message_text, message_type, is_read, whatsapp_message_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, now())) \
             RETURNING {}",
            self.table(MESSAGES_TABLE),
            MESSAGE_COLUMNS
        );

        let row: MessageRow = sqlx::query_as(&sql)
            .bind(&message.from_number)
            .bind(&message.customer_name)
            .bind(&message.message_text)
            .bind(message.message_type.as_str())
            .bind(message.is_read)
            .bind(&message.whatsapp_message_id)
            .bind(message.created_at)
            .fetch_one(&self.pool)
            .await?;

        Message::try_from(row)
    }

    async fn mark_read(&self, phone: &str) -> Result<u64, DatabaseError> {
        let sql = format!(
            "UPDATE {} SET is_read = true WHERE from_number = $1 AND message_type = 'incoming' AND is_read = false",
            self.table(MESSAGES_TABLE)
        );
        let result = sqlx::query(&sql).bind(phone).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl StoreHealth for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
