//! ConfigLoader - turns settings into installed snapshots.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info};

use super::{CdrSettings, ConfigSnapshot, ConfigStore};
use crate::broker::ConnectionProvider;
use crate::error::PipelineError;

/// Builds [`ConfigSnapshot`]s and installs them into a [`ConfigStore`].
///
/// `build` has no visible side effect: the store only changes when a
/// complete snapshot, including a live broker handle, is ready. A reload
/// that cannot connect therefore leaves the working configuration alone.
pub struct ConfigLoader<P> {
    provider: P,
    store: Arc<ConfigStore>,
    generation: AtomicU64,
    reloading: Mutex<()>,
}

impl<P: ConnectionProvider> ConfigLoader<P> {
    /// Create a loader that resolves connections through `provider`.
    pub fn new(provider: P, store: Arc<ConfigStore>) -> Self {
        Self {
            provider,
            store,
            generation: AtomicU64::new(0),
            reloading: Mutex::new(()),
        }
    }

    /// The store this loader installs into.
    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Build a snapshot without installing it.
    ///
    /// Always asks the provider for a fresh handle, even when the
    /// connection name is unchanged, so that a reload can recover a broken
    /// connection.
    pub async fn build(&self, settings: &CdrSettings) -> Result<ConfigSnapshot, PipelineError> {
        let name = settings.connection_name.as_str();

        let broker = self
            .provider
            .get_connection(name)
            .await
            .map_err(|source| PipelineError::ConnectionUnavailable {
                name: name.to_string(),
                source,
            })?;

        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(ConfigSnapshot::new(settings.clone(), Some(broker), generation))
    }

    /// Build and install the first configuration.
    ///
    /// Failure means the backend must not activate.
    pub async fn initial_load(
        &self,
        settings: &CdrSettings,
    ) -> Result<Arc<ConfigSnapshot>, PipelineError> {
        match self.build_and_install(settings).await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                error!(error = %e, "configuration failed to load, declining activation");
                Err(e)
            }
        }
    }

    /// Build and install a replacement configuration.
    ///
    /// On failure the previously installed snapshot, and its connection,
    /// stay active.
    pub async fn reload(&self, settings: &CdrSettings) -> Result<Arc<ConfigSnapshot>, PipelineError> {
        match self.build_and_install(settings).await {
            Ok(snapshot) => {
                info!(
                    generation = snapshot.generation(),
                    connection = %snapshot.connection_name(),
                    "configuration reloaded"
                );
                Ok(snapshot)
            }
            Err(e) => {
                error!(
                    error = %e,
                    kept = self.store.is_installed(),
                    "reload failed, keeping previous configuration"
                );
                Err(e)
            }
        }
    }

    async fn build_and_install(
        &self,
        settings: &CdrSettings,
    ) -> Result<Arc<ConfigSnapshot>, PipelineError> {
        // Serialize loads so a slow build cannot overwrite a newer one.
        let _guard = self.reloading.lock().await;

        let snapshot = Arc::new(self.build(settings).await?);
        self.store.install(snapshot.clone());
        Ok(snapshot)
    }
}

impl<P> std::fmt::Debug for ConfigLoader<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("store", &self.store)
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .finish()
    }
}
