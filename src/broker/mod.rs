//! Broker abstraction.
//!
//! The pipeline never talks to a wire protocol directly. It consumes two
//! seams provided by a connection-management layer:
//!
//! - [`ConnectionProvider`]: resolves a configured connection name to a live
//!   [`BrokerHandle`].
//! - [`BrokerHandle`]: publishes one message to an exchange/routing key.
//!
//! Handles are shared (`Arc`) between the installed configuration snapshot
//! and every in-flight publish, so implementations must accept concurrent
//! `publish` calls.
//!
//! Two implementations ship with the crate:
//!
//! - [`memory`]: in-process handles that record what was published
//! - `amqp` (feature `amqp`): lapin-backed AMQP 0-9-1 connections

pub mod memory;

#[cfg(feature = "amqp")]
pub mod amqp;

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BrokerError;

/// MIME type of every published document.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// AMQP delivery mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryMode {
    /// The broker may drop the message on restart.
    Transient,
    /// The broker persists the message across restarts.
    Persistent,
}

impl DeliveryMode {
    /// Wire value of the delivery mode property.
    pub const fn as_u8(&self) -> u8 {
        match self {
            DeliveryMode::Transient => 1,
            DeliveryMode::Persistent => 2,
        }
    }
}

/// Per-message properties attached to a publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryProperties {
    /// MIME content type of the body.
    pub content_type: String,
    /// Whether the broker should persist the message.
    pub delivery_mode: DeliveryMode,
}

/// A single message handed to a [`BrokerHandle`].
#[derive(Debug, Clone, Copy)]
pub struct OutboundMessage<'a> {
    /// Exchange to publish to; empty means the broker's default exchange.
    pub exchange: &'a str,
    /// Routing key (queue name when using the default exchange).
    pub routing_key: &'a str,
    /// Return the message if it cannot be routed.
    pub mandatory: bool,
    /// Require an immediately available consumer.
    pub immediate: bool,
    /// Delivery properties.
    pub properties: &'a DeliveryProperties,
    /// Serialized document.
    pub body: &'a [u8],
}

/// A live connection able to publish messages.
#[async_trait]
pub trait BrokerHandle: Send + Sync + Debug {
    /// Name of the connection this handle was obtained for.
    fn connection_name(&self) -> &str;

    /// Publish one message. Exactly one attempt is made.
    async fn publish(&self, message: OutboundMessage<'_>) -> Result<(), BrokerError>;
}

/// Resolves connection names to live broker handles.
///
/// Called at initial load and on every reload, so an implementation may
/// use it to replace a connection that has gone bad.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Obtain a handle for `name`.
    async fn get_connection(&self, name: &str) -> Result<Arc<dyn BrokerHandle>, BrokerError>;
}

#[async_trait]
impl<P: ConnectionProvider + ?Sized> ConnectionProvider for Arc<P> {
    async fn get_connection(&self, name: &str) -> Result<Arc<dyn BrokerHandle>, BrokerError> {
        (**self).get_connection(name).await
    }
}

/// Compare two handles by identity.
pub fn same_handle(a: &Arc<dyn BrokerHandle>, b: &Arc<dyn BrokerHandle>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
