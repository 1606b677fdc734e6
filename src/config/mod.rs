//! Configuration: parsed settings, immutable snapshots, the store that
//! holds the current one, and the loader that builds and installs them.

mod loader;
mod settings;
mod snapshot;
mod store;

pub use loader::ConfigLoader;
pub use settings::{BackendFile, CdrSettings, ConnectionSettings, DEFAULT_ROUTING_KEY, ENV_PREFIX};
pub use snapshot::ConfigSnapshot;
pub use store::ConfigStore;
