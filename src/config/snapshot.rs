//! ConfigSnapshot - an immutable configuration + connection bundle.

use std::fmt;
use std::sync::Arc;

use super::CdrSettings;
use crate::broker::BrokerHandle;

/// Everything a publish needs, frozen at load time.
///
/// A snapshot is never mutated once built. Reloads build a new one and
/// swap it into the [`ConfigStore`](super::ConfigStore); publishes that
/// already hold the old one keep using it until they finish.
#[derive(Clone)]
pub struct ConfigSnapshot {
    settings: CdrSettings,
    broker: Option<Arc<dyn BrokerHandle>>,
    generation: u64,
}

impl ConfigSnapshot {
    /// Bundle settings with a broker handle.
    pub fn new(settings: CdrSettings, broker: Option<Arc<dyn BrokerHandle>>, generation: u64) -> Self {
        Self {
            settings,
            broker,
            generation,
        }
    }

    /// Emit the call's unique id.
    pub fn include_unique_id(&self) -> bool {
        self.settings.include_unique_id
    }

    /// Emit the call's user field.
    pub fn include_user_field(&self) -> bool {
        self.settings.include_user_field
    }

    /// Name of the connection the broker handle was obtained for.
    pub fn connection_name(&self) -> &str {
        &self.settings.connection_name
    }

    /// Exchange to publish to.
    pub fn exchange(&self) -> &str {
        &self.settings.exchange
    }

    /// Routing key to publish with.
    pub fn routing_key(&self) -> &str {
        &self.settings.routing_key
    }

    /// The live broker handle, if connected.
    pub fn broker(&self) -> Option<&Arc<dyn BrokerHandle>> {
        self.broker.as_ref()
    }

    /// The settings this snapshot was built from.
    pub fn settings(&self) -> &CdrSettings {
        &self.settings
    }

    /// Install sequence number assigned by the loader.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Debug for ConfigSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigSnapshot")
            .field("generation", &self.generation)
            .field("settings", &self.settings)
            .field("connected", &self.broker.is_some())
            .finish()
    }
}
