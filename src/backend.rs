//! Host-facing entry points.
//!
//! A telephony host activates the backend once, forwards every completed
//! call to [`CdrBackend::log_record`], asks it to [`reload`](CdrBackend::reload)
//! when the operator changes the configuration, and shuts it down on unload.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use cdr_amqp_types::CallRecord;
use tracing::{debug, error, info};

use crate::broker::ConnectionProvider;
use crate::config::{BackendFile, CdrSettings, ConfigLoader, ConfigStore, ConnectionSettings};
use crate::error::PipelineError;
use crate::publisher::Publisher;
use crate::serializer::RecordSerializer;

/// Name the backend registers under with the host.
pub const BACKEND_NAME: &str = "AMQP";

/// Human-readable description shown by the host.
pub const BACKEND_DESCRIPTION: &str = "AMQP CDR Backend";

/// Outcome of [`CdrBackend::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// The backend is ready to receive records.
    Active,
    /// Initial configuration failed; the host must not route records here.
    Declined,
}

/// The CDR export backend.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use cdr_amqp::{Activation, CdrBackend, CdrSettings};
/// use cdr_amqp::broker::memory::MemoryConnections;
/// use cdr_amqp_types::CallRecord;
///
/// # tokio_test::block_on(async {
/// let connections = Arc::new(MemoryConnections::new());
/// let broker = connections.insert("main");
///
/// let backend = CdrBackend::new(connections);
/// let activation = backend.initialize(&CdrSettings::with_connection("main")).await;
/// assert_eq!(activation, Activation::Active);
///
/// let record = CallRecord::builder().src("100").dst("200").build();
/// backend.log_record(&record).await.unwrap();
/// assert_eq!(broker.published().len(), 1);
///
/// backend.shutdown();
/// assert!(backend.log_record(&record).await.is_err());
/// # });
/// ```
#[derive(Debug)]
pub struct CdrBackend<P> {
    loader: ConfigLoader<P>,
    serializer: RecordSerializer,
    publisher: Publisher,
}

impl<P: ConnectionProvider> CdrBackend<P> {
    /// Create a backend resolving connections through `provider`.
    pub fn new(provider: P) -> Self {
        Self::with_store(provider, Arc::new(ConfigStore::new()))
    }

    /// Create a backend around an existing store.
    pub fn with_store(provider: P, store: Arc<ConfigStore>) -> Self {
        Self {
            loader: ConfigLoader::new(provider, store),
            serializer: RecordSerializer::new(),
            publisher: Publisher::new(),
        }
    }

    /// The configuration store.
    pub fn store(&self) -> &Arc<ConfigStore> {
        self.loader.store()
    }

    /// The configuration loader.
    pub fn loader(&self) -> &ConfigLoader<P> {
        &self.loader
    }

    /// Load the initial configuration.
    ///
    /// Declines activation when no working configuration could be built.
    pub async fn initialize(&self, settings: &CdrSettings) -> Activation {
        match self.loader.initial_load(settings).await {
            Ok(snapshot) => {
                info!(
                    backend = BACKEND_NAME,
                    description = BACKEND_DESCRIPTION,
                    connection = %snapshot.connection_name(),
                    exchange = %snapshot.exchange(),
                    routing_key = %snapshot.routing_key(),
                    "CDR AMQP logging enabled"
                );
                Activation::Active
            }
            Err(_) => Activation::Declined,
        }
    }

    /// Swap in a new configuration. The previous one stays active on failure.
    pub async fn reload(&self, settings: &CdrSettings) -> Result<(), PipelineError> {
        self.loader.reload(settings).await.map(|_| ())
    }

    /// Re-read the configuration file at `path` and reload from it.
    ///
    /// `configure` receives the file's connection definitions before the
    /// reload is attempted. A file that cannot be read or parsed changes
    /// nothing: neither `configure` nor the installed snapshot is touched.
    pub async fn reload_file<F>(&self, path: &Path, configure: F) -> Result<(), PipelineError>
    where
        F: FnOnce(BTreeMap<String, ConnectionSettings>),
    {
        let file = BackendFile::load(path).map_err(|e| {
            error!(
                config = %path.display(),
                error = %e,
                "could not read configuration, keeping previous configuration"
            );
            e
        })?;

        configure(file.connections);
        self.reload(&file.global).await
    }

    /// Release the installed configuration and its connection reference.
    ///
    /// Publishes already in flight finish with the snapshot they hold.
    pub fn shutdown(&self) {
        if self.store().is_installed() {
            info!(backend = BACKEND_NAME, "CDR AMQP logging disabled");
        }
        self.store().release();
    }

    /// Serialize and publish one completed call.
    ///
    /// The snapshot is acquired once, so flags, addressing and connection
    /// all come from the same configuration even if a reload lands
    /// mid-call.
    pub async fn log_record(&self, record: &CallRecord) -> Result<(), PipelineError> {
        let snapshot = self.store().current()?;

        let document = self
            .serializer
            .serialize(record, &snapshot)
            .map_err(|e| {
                error!(error = %e, "failed to build string from JSON");
                e
            })?;

        self.publisher.publish(&snapshot, &document).await?;

        debug!(
            generation = snapshot.generation(),
            linkedid = %record.linkedid,
            "CDR logged"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::memory::MemoryConnections;

    fn backend() -> (Arc<MemoryConnections>, CdrBackend<Arc<MemoryConnections>>) {
        let connections = Arc::new(MemoryConnections::new());
        let backend = CdrBackend::new(connections.clone());
        (connections, backend)
    }

    #[tokio::test]
    async fn test_initialize_declines_without_connection() {
        let (_connections, backend) = backend();

        let activation = backend
            .initialize(&CdrSettings::with_connection("main"))
            .await;

        assert_eq!(activation, Activation::Declined);
        assert!(!backend.store().is_installed());
    }

    #[tokio::test]
    async fn test_log_record_before_initialize() {
        let (_connections, backend) = backend();
        let record = CallRecord::builder().build();

        let err = backend.log_record(&record).await.unwrap_err();
        assert!(matches!(err, PipelineError::ConfigUnavailable));
    }

    #[tokio::test]
    async fn test_reload_switches_routing() {
        let (connections, backend) = backend();
        let broker = connections.insert("main");
        backend
            .initialize(&CdrSettings::with_connection("main"))
            .await;

        let record = CallRecord::builder().src("100").build();
        backend.log_record(&record).await.unwrap();

        let reloaded = CdrSettings {
            routing_key: "cdr-v2".to_string(),
            ..CdrSettings::with_connection("main")
        };
        backend.reload(&reloaded).await.unwrap();
        backend.log_record(&record).await.unwrap();

        let keys: Vec<_> = broker
            .published()
            .into_iter()
            .map(|m| m.routing_key)
            .collect();
        assert_eq!(keys, vec!["asterisk_cdr".to_string(), "cdr-v2".to_string()]);
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        use std::io::Write;
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_reload_file_applies_connections_and_settings() {
        let (connections, backend) = backend();
        connections.insert("main");
        let backup = connections.insert("backup");
        backend
            .initialize(&CdrSettings::with_connection("main"))
            .await;

        let file = write_config(
            r#"
[global]
connection = "backup"
queue = "cdr-v2"

[connections.backup]
url = "amqp://localhost:5672/%2f"
"#,
        );
        let mut configured: Vec<String> = Vec::new();
        backend
            .reload_file(file.path(), |defs| configured.extend(defs.into_keys()))
            .await
            .unwrap();

        assert_eq!(configured, vec!["backup".to_string()]);
        let current = backend.store().current().unwrap();
        assert_eq!(current.connection_name(), "backup");
        assert_eq!(current.routing_key(), "cdr-v2");

        backend.log_record(&CallRecord::builder().build()).await.unwrap();
        assert_eq!(backup.published().len(), 1);
    }

    #[tokio::test]
    async fn test_unparsable_file_keeps_previous_configuration() {
        let (connections, backend) = backend();
        connections.insert("main");
        backend
            .initialize(&CdrSettings::with_connection("main"))
            .await;
        let before = backend.store().current().unwrap();

        let file = write_config("[global\nconnection = ");
        let mut configured = false;
        let err = backend
            .reload_file(file.path(), |_| configured = true)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::InvalidConfig(_)));
        assert!(!configured);
        let after = backend.store().current().unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(connections.requests(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let (connections, backend) = backend();
        connections.insert("main");
        backend
            .initialize(&CdrSettings::with_connection("main"))
            .await;

        backend.shutdown();
        backend.shutdown();

        assert!(!backend.store().is_installed());
        let record = CallRecord::builder().build();
        assert!(matches!(
            backend.log_record(&record).await,
            Err(PipelineError::ConfigUnavailable)
        ));
    }

    #[tokio::test]
    async fn test_publish_failure_does_not_disturb_configuration() {
        let (connections, backend) = backend();
        let broker = connections.insert("main");
        backend
            .initialize(&CdrSettings::with_connection("main"))
            .await;

        broker.reject_if(|_| true);
        let record = CallRecord::builder().build();
        assert!(matches!(
            backend.log_record(&record).await,
            Err(PipelineError::PublishFailed(_))
        ));

        broker.accept_all();
        backend.log_record(&record).await.unwrap();
        assert_eq!(broker.published().len(), 1);
    }
}
