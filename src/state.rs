//! Shared handler state.
//!
//! Every external collaborator is an injected handle; `main` builds the
//! concrete clients once and owns their shutdown, tests swap in fakes.

use std::sync::Arc;

use crate::auth::IdentityProvider;
use crate::config::AppConfig;
use crate::database::{MessageStore, ProfileStore, StoreHealth, ThemeStore, UserStore};
use crate::hashing::PasswordHasher;
use crate::messaging::MessagingTransport;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub identity: Arc<dyn IdentityProvider>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub users: Arc<dyn UserStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub themes: Arc<dyn ThemeStore>,
    pub messages: Arc<dyn MessageStore>,
    pub store_health: Arc<dyn StoreHealth>,
    pub transport: Arc<dyn MessagingTransport>,
}

impl AppState {
    /// Wire every store seam to one backing store
    pub fn new<S>(
        config: AppConfig,
        identity: Arc<dyn IdentityProvider>,
        hasher: Arc<dyn PasswordHasher>,
        store: Arc<S>,
        transport: Arc<dyn MessagingTransport>,
    ) -> Self
    where
        S: UserStore + ProfileStore + ThemeStore + MessageStore + StoreHealth + 'static,
    {
        Self {
            config: Arc::new(config),
            identity,
            hasher,
            users: store.clone(),
            profiles: store.clone(),
            themes: store.clone(),
            messages: store.clone(),
            store_health: store,
            transport,
        }
    }
}
