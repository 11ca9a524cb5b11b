//! One-way password hashing for registration.
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=..,t=..,p=1$salt$hash`) so the
//! cost parameters travel with each stored hash.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use async_trait::async_trait;
use thiserror::Error;

use crate::config::SecurityConfig;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("invalid hashing parameters: {0}")]
    InvalidParams(String),

    #[error("hashing failed: {0}")]
    Failed(String),

    #[error("hashing task aborted: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, password: &str) -> Result<String, HashError>;
}

/// Argon2id hasher. `cost` is the iteration count, `memory_kib` the memory
/// block size; parallelism is fixed at 1.
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    pub fn new(cost: u32, memory_kib: u32) -> Result<Self, HashError> {
        let params = Params::new(memory_kib, cost, 1, None)
            .map_err(|e| HashError::InvalidParams(e.to_string()))?;
        Ok(Self { params })
    }

    pub fn from_config(config: &SecurityConfig) -> Result<Self, HashError> {
        Self::new(config.password_hash_cost, config.password_hash_memory_kib)
    }

    fn hash_blocking(params: Params, password: &str) -> Result<String, HashError> {
        use argon2::PasswordHasher as _;

        let salt = SaltString::generate(&mut OsRng);
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HashError::Failed(e.to_string()))
    }
}

#[async_trait]
impl PasswordHasher for Argon2Hasher {
    async fn hash(&self, password: &str) -> Result<String, HashError> {
        // Argon2 is deliberately slow; keep it off the async workers.
        let params = self.params.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || Self::hash_blocking(params, &password)).await?
    }
}
