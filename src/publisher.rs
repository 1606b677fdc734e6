//! Publishing a serialized record through a snapshot's broker handle.

use tracing::{debug, error};

use crate::broker::{DeliveryMode, DeliveryProperties, OutboundMessage, CONTENT_TYPE_JSON};
use crate::config::ConfigSnapshot;
use crate::error::PipelineError;
use crate::serializer::PublishedDocument;

/// Delivers documents to the broker.
///
/// Exactly one publish attempt per call: no retry, no local buffering.
/// Messages are persistent JSON, not mandatory (unroutable messages are
/// dropped by the broker) and not immediate (the broker may queue them).
#[derive(Debug, Clone)]
pub struct Publisher {
    properties: DeliveryProperties,
}

impl Publisher {
    /// Create a publisher sending persistent `application/json` messages.
    pub fn new() -> Self {
        Self {
            properties: DeliveryProperties {
                content_type: CONTENT_TYPE_JSON.to_string(),
                delivery_mode: DeliveryMode::Persistent,
            },
        }
    }

    /// Properties attached to every message.
    pub fn properties(&self) -> &DeliveryProperties {
        &self.properties
    }

    /// Publish `document` to the exchange and routing key of `snapshot`.
    pub async fn publish(
        &self,
        snapshot: &ConfigSnapshot,
        document: &PublishedDocument,
    ) -> Result<(), PipelineError> {
        let broker = snapshot.broker().ok_or(PipelineError::NoConnection)?;

        let message = OutboundMessage {
            exchange: snapshot.exchange(),
            routing_key: snapshot.routing_key(),
            mandatory: false,
            immediate: false,
            properties: &self.properties,
            body: document.body(),
        };

        match broker.publish(message).await {
            Ok(()) => {
                debug!(
                    generation = snapshot.generation(),
                    exchange = %snapshot.exchange(),
                    routing_key = %snapshot.routing_key(),
                    bytes = document.body().len(),
                    "CDR published"
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    connection = %broker.connection_name(),
                    error = %e,
                    "error publishing CDR to AMQP"
                );
                Err(PipelineError::PublishFailed(e))
            }
        }
    }
}

impl Default for Publisher {
    fn default() -> Self {
        Self::new()
    }
}
