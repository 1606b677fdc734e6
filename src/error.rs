//! Error types for the publish pipeline.

use thiserror::Error;

/// Errors reported by a broker connection or the connection provider.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// No connection is configured under this name.
    #[error("Unknown connection: {0}")]
    UnknownConnection(String),

    /// Connecting to the broker failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The broker rejected the publish or the channel failed mid-publish.
    #[error("Publish failed: {0}")]
    Publish(String),

    /// The broker did not complete the request in time.
    #[error("Request timed out")]
    Timeout,

    /// The connection has been closed.
    #[error("Connection closed")]
    Closed,
}

#[cfg(feature = "amqp")]
impl From<lapin::Error> for BrokerError {
    fn from(err: lapin::Error) -> Self {
        match err {
            lapin::Error::InvalidConnectionState(_) | lapin::Error::InvalidChannelState(_) => {
                BrokerError::Closed
            }
            lapin::Error::IOError(e) => BrokerError::Connection(e.to_string()),
            other => BrokerError::Publish(other.to_string()),
        }
    }
}

/// Errors surfaced by the export backend.
///
/// `ConnectionUnavailable` and `InvalidConfig` only come out of loading or
/// reloading configuration. The remaining variants are per-call failures
/// and never affect other calls.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No configuration snapshot is installed (startup race or after shutdown).
    #[error("No configuration installed")]
    ConfigUnavailable,

    /// The configuration file could not be read or parsed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A broker handle could not be obtained for the named connection.
    #[error("Could not get AMQP connection '{name}'")]
    ConnectionUnavailable {
        /// Connection name from the configuration.
        name: String,
        /// Why the provider refused.
        #[source]
        source: BrokerError,
    },

    /// The installed snapshot carries no broker handle.
    #[error("No broker connection in current configuration")]
    NoConnection,

    /// The record could not be rendered to JSON.
    #[error("Failed to build JSON document: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The broker did not accept the message.
    #[error("Error publishing CDR to AMQP")]
    PublishFailed(#[source] BrokerError),
}

impl From<config::ConfigError> for PipelineError {
    fn from(err: config::ConfigError) -> Self {
        PipelineError::InvalidConfig(err.to_string())
    }
}

impl PipelineError {
    /// Whether this error only concerns a single record.
    pub fn is_per_call(&self) -> bool {
        matches!(
            self,
            PipelineError::NoConnection
                | PipelineError::Encoding(_)
                | PipelineError::PublishFailed(_)
                | PipelineError::ConfigUnavailable
        )
    }
}
