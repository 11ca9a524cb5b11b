//! Single-active-theme switching.
//!
//! Activation runs two ordered store updates with no transaction around them:
//!
//! 1. deactivate every theme
//! 2. activate the target
//!
//! A failure in step 1 leaves the theme set untouched. A failure in step 2
//! leaves zero active themes and is reported as
//! [`ActivationError::PartialActivation`] so the caller can rerun step 2 alone
//! via [`ThemeActivationManager::resume`]. Resuming is only allowed from that
//! zero-active state.
//!
//! Concurrent activations are not serialised: whichever call's step 2 lands
//! last wins.

use thiserror::Error;
use uuid::Uuid;

use crate::database::{DatabaseError, ThemeStore};

#[derive(Debug, Error)]
pub enum ActivationError {
    #[error("theme {0} does not exist")]
    NotFound(Uuid),

    #[error("nothing to resume, {active} theme(s) already active")]
    NothingToResume { active: u64 },

    #[error("theme lookup failed: {0}")]
    Lookup(#[source] DatabaseError),

    #[error("deactivating themes failed, nothing changed: {0}")]
    Deactivate(#[source] DatabaseError),

    #[error("themes deactivated but {theme_id} was not activated: {source}")]
    PartialActivation {
        theme_id: Uuid,
        #[source]
        source: DatabaseError,
    },
}

pub struct ThemeActivationManager<'a> {
    store: &'a dyn ThemeStore,
}

impl<'a> ThemeActivationManager<'a> {
    pub fn new(store: &'a dyn ThemeStore) -> Self {
        Self { store }
    }

    /// Make `theme_id` the only active theme.
    pub async fn activate(&self, theme_id: Uuid) -> Result<(), ActivationError> {
        self.ensure_exists(theme_id).await?;

        let deactivated = self
            .store
            .deactivate_all()
            .await
            .map_err(ActivationError::Deactivate)?;
        tracing::debug!("Deactivated {} theme(s) before activating {}", deactivated, theme_id);

        self.activate_target(theme_id).await
    }

    /// Step 2 only, to recover from a partial activation. Refused unless no
    /// theme is currently active.
    pub async fn resume(&self, theme_id: Uuid) -> Result<(), ActivationError> {
        self.ensure_exists(theme_id).await?;

        let active = self
            .store
            .active_count()
            .await
            .map_err(ActivationError::Lookup)?;
        if active > 0 {
            return Err(ActivationError::NothingToResume { active });
        }

        self.activate_target(theme_id).await
    }

    async fn ensure_exists(&self, theme_id: Uuid) -> Result<(), ActivationError> {
        let exists = self
            .store
            .theme_exists(theme_id)
            .await
            .map_err(ActivationError::Lookup)?;
        if exists {
            Ok(())
        } else {
            Err(ActivationError::NotFound(theme_id))
        }
    }

    async fn activate_target(&self, theme_id: Uuid) -> Result<(), ActivationError> {
        match self.store.activate(theme_id).await {
            Ok(0) => Err(ActivationError::PartialActivation {
                theme_id,
                source: DatabaseError::NotFound(format!("theme {} disappeared before activation", theme_id)),
            }),
            Ok(_) => {
                tracing::info!("Activated theme {}", theme_id);
                Ok(())
            }
            Err(source) => Err(ActivationError::PartialActivation { theme_id, source }),
        }
    }
}
