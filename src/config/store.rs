//! ConfigStore - the slot holding the current snapshot.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::ConfigSnapshot;
use crate::error::PipelineError;

/// Holder of the currently installed [`ConfigSnapshot`].
///
/// Reads take the lock only long enough to clone the `Arc`; the caller then
/// owns a stable view for as long as it likes. `install` swaps the `Arc`
/// under the write lock and drops the old one after releasing it, so a
/// superseded snapshot is freed by whichever holder finishes last.
///
/// # Example
///
/// ```rust
/// use cdr_amqp::config::{CdrSettings, ConfigSnapshot, ConfigStore};
///
/// let store = ConfigStore::new();
/// assert!(store.current().is_err());
///
/// store.install(ConfigSnapshot::new(CdrSettings::default(), None, 1));
/// let snapshot = store.current().unwrap();
/// assert_eq!(snapshot.routing_key(), "asterisk_cdr");
///
/// store.release();
/// assert!(store.current().is_err());
/// // The reader's copy is unaffected.
/// assert_eq!(snapshot.generation(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ConfigStore {
    current: RwLock<Option<Arc<ConfigSnapshot>>>,
}

impl ConfigStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `snapshot` the current configuration.
    pub fn install(&self, snapshot: impl Into<Arc<ConfigSnapshot>>) {
        let snapshot = snapshot.into();
        let generation = snapshot.generation();
        let previous = self.current.write().replace(snapshot);
        debug!(
            generation,
            replaced = previous.as_ref().map(|s| s.generation()),
            "configuration snapshot installed"
        );
    }

    /// Get a strong reference to the current snapshot.
    pub fn current(&self) -> Result<Arc<ConfigSnapshot>, PipelineError> {
        self.current
            .read()
            .clone()
            .ok_or(PipelineError::ConfigUnavailable)
    }

    /// Drop the store's reference. Safe to call more than once.
    pub fn release(&self) {
        let previous = self.current.write().take();
        if let Some(snapshot) = previous {
            debug!(generation = snapshot.generation(), "configuration snapshot released");
        }
    }

    /// Whether a snapshot is installed.
    pub fn is_installed(&self) -> bool {
        self.current.read().is_some()
    }
}
