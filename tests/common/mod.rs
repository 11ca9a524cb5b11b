#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use uuid::Uuid;

use storefront_api::auth::{Claims, JwtIdentityProvider};
use storefront_api::config::AppConfig;
use storefront_api::database::{
    DatabaseError, Message, MessageStore, NewMessage, NewUser, Profile, ProfileStore,
    RegistrationOutcome, StoreHealth, Theme, ThemeStore, UserStore,
};
use storefront_api::hashing::{HashError, PasswordHasher};
use storefront_api::messaging::{MessagingTransport, SendReceipt, TransportError};
use storefront_api::state::AppState;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const VERIFY_TOKEN: &str = "integration-verify-token";

/// In-memory stand-in for every store seam, with switches to make each
/// operation fail.
#[derive(Default)]
pub struct MemoryStore {
    pub profiles: Mutex<HashMap<Uuid, Profile>>,
    pub themes: Mutex<Vec<Theme>>,
    pub messages: Mutex<Vec<Message>>,
    pub registrations: Mutex<Vec<NewUser>>,
    pub register_outcome: Mutex<Option<RegistrationOutcome>>,
    /// Theme operations in call order
    pub theme_calls: Mutex<Vec<&'static str>>,
    pub fail_ping: AtomicBool,
    pub fail_list: AtomicBool,
    pub fail_insert: AtomicBool,
    pub fail_deactivate: AtomicBool,
    pub fail_activate: AtomicBool,
}

fn unavailable(op: &str) -> DatabaseError {
    DatabaseError::QueryError(format!("{} failed: connection reset", op))
}

impl MemoryStore {
    pub fn add_profile(&self, user_id: Uuid, fields: Value) {
        let mut map = match fields {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        map.insert("id".into(), json!(user_id));
        self.profiles.lock().unwrap().insert(user_id, Profile(map));
    }

    pub fn add_theme(&self, is_active: bool) -> Uuid {
        let id = Uuid::new_v4();
        self.themes.lock().unwrap().push(Theme { id, is_active });
        id
    }

    pub fn active_themes(&self) -> Vec<Uuid> {
        self.themes
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.is_active)
            .map(|t| t.id)
            .collect()
    }

    pub fn seed_message(&self, message: NewMessage) -> Message {
        self.store_message(&message)
    }

    fn store_message(&self, message: &NewMessage) -> Message {
        let stored = Message {
            id: Uuid::new_v4(),
            from_number: message.from_number.clone(),
            customer_name: message.customer_name.clone(),
            message_text: message.message_text.clone(),
            message_type: message.message_type,
            is_read: message.is_read,
            whatsapp_message_id: message.whatsapp_message_id.clone(),
            created_at: message.created_at.unwrap_or_else(Utc::now),
        };
        self.messages.lock().unwrap().push(stored.clone());
        stored
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn register_user(&self, user: &NewUser) -> Result<RegistrationOutcome, DatabaseError> {
        self.registrations.lock().unwrap().push(user.clone());

        if let Some(outcome) = self.register_outcome.lock().unwrap().clone() {
            return Ok(outcome);
        }
        Ok(RegistrationOutcome {
            success: true,
            user: Some(json!({ "id": Uuid::new_v4(), "email": user.email, "name": user.name })),
            error: None,
        })
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>, DatabaseError> {
        Ok(self.profiles.lock().unwrap().get(&user_id).cloned())
    }
}

#[async_trait]
impl ThemeStore for MemoryStore {
    async fn theme_exists(&self, id: Uuid) -> Result<bool, DatabaseError> {
        self.theme_calls.lock().unwrap().push("exists");
        Ok(self.themes.lock().unwrap().iter().any(|t| t.id == id))
    }

    async fn active_count(&self) -> Result<u64, DatabaseError> {
        self.theme_calls.lock().unwrap().push("active_count");
        Ok(self.active_themes().len() as u64)
    }

    async fn deactivate_all(&self) -> Result<u64, DatabaseError> {
        self.theme_calls.lock().unwrap().push("deactivate_all");
        if self.fail_deactivate.load(Ordering::SeqCst) {
            return Err(unavailable("deactivate"));
        }
        let mut themes = self.themes.lock().unwrap();
        for theme in themes.iter_mut() {
            theme.is_active = false;
        }
        Ok(themes.len() as u64)
    }

    async fn activate(&self, id: Uuid) -> Result<u64, DatabaseError> {
        self.theme_calls.lock().unwrap().push("activate");
        if self.fail_activate.load(Ordering::SeqCst) {
            return Err(unavailable("activate"));
        }
        let mut touched = 0;
        for theme in self.themes.lock().unwrap().iter_mut().filter(|t| t.id == id) {
            theme.is_active = true;
            touched += 1;
        }
        Ok(touched)
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn list_messages(&self, phone: Option<&str>) -> Result<Vec<Message>, DatabaseError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(unavailable("list"));
        }
        let mut messages: Vec<Message> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| phone.map_or(true, |p| m.from_number == p))
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    async fn insert_message(&self, message: &NewMessage) -> Result<Message, DatabaseError> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(unavailable("insert"));
        }
        Ok(self.store_message(message))
    }

    async fn mark_read(&self, phone: &str) -> Result<u64, DatabaseError> {
        let mut touched = 0;
        for message in self
            .messages
            .lock()
            .unwrap()
            .iter_mut()
            .filter(|m| m.from_number == phone && m.is_unread_incoming())
        {
            message.is_read = true;
            touched += 1;
        }
        Ok(touched)
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        if self.fail_ping.load(Ordering::SeqCst) {
            return Err(unavailable("ping"));
        }
        Ok(())
    }
}

/// Records every send; fails them all when `fail` is set
#[derive(Default)]
pub struct FakeTransport {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl MessagingTransport for FakeTransport {
    async fn send(&self, to: &str, text: &str) -> Result<SendReceipt, TransportError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(TransportError::Rejected {
                status: 400,
                reason: "Recipient phone number not in allowed list".into(),
            });
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push((to.to_string(), text.to_string()));
        Ok(SendReceipt {
            message_id: format!("wamid.test{}", sent.len()),
        })
    }
}

/// Cheap reversible "hash" so tests can see what reached the store
#[derive(Default)]
pub struct FakeHasher {
    pub calls: AtomicUsize,
}

#[async_trait]
impl PasswordHasher for FakeHasher {
    async fn hash(&self, password: &str) -> Result<String, HashError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("hashed:{}", password))
    }
}

pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub store: Arc<MemoryStore>,
    pub transport: Arc<FakeTransport>,
    pub hasher: Arc<FakeHasher>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self.client.get(self.url(path)).send().await?)
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<reqwest::Response> {
        Ok(self.client.post(self.url(path)).json(&body).send().await?)
    }
}

pub fn test_config() -> AppConfig {
    AppConfig::from_lookup(|key| match key {
        "JWT_SECRET" => Some(TEST_SECRET.to_string()),
        "WHATSAPP_VERIFY_TOKEN" => Some(VERIFY_TOKEN.to_string()),
        _ => None,
    })
}

/// Signed session token for `user_id`, valid for an hour
pub fn session_token(user_id: Uuid) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        email: Some("shopper@example.com".into()),
        role: Some("authenticated".into()),
        exp: now + 3600,
        iat: Some(now),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(TEST_SECRET.as_bytes()))
        .expect("encode test token")
}

pub fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

/// Serve the full router over in-memory fakes on a free local port
pub async fn spawn_app() -> Result<TestApp> {
    let store = Arc::new(MemoryStore::default());
    let transport = Arc::new(FakeTransport::default());
    let hasher = Arc::new(FakeHasher::default());

    let identity = Arc::new(JwtIdentityProvider::new(TEST_SECRET)?);
    let state = AppState::new(test_config(), identity, hasher.clone(), store.clone(), transport.clone());

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;

    let router = storefront_api::app(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Ok(TestApp {
        base_url: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        store,
        transport,
        hasher,
    })
}
