//! In-process broker handles.
//!
//! [`MemoryBroker`] records every message it accepts instead of sending it
//! anywhere, and [`MemoryConnections`] resolves names to such brokers. They
//! are useful for dry runs, for tests, and for hosts that want to inspect
//! what would have been published.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use super::{BrokerHandle, ConnectionProvider, DeliveryProperties, OutboundMessage};
use crate::error::BrokerError;

/// A message accepted by a [`MemoryBroker`].
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedMessage {
    /// Exchange the message was sent to.
    pub exchange: String,
    /// Routing key it was sent with.
    pub routing_key: String,
    /// The `mandatory` publish flag.
    pub mandatory: bool,
    /// The `immediate` publish flag.
    pub immediate: bool,
    /// Content type and delivery mode.
    pub properties: DeliveryProperties,
    /// Message body.
    pub body: Vec<u8>,
}

impl PublishedMessage {
    /// Parse the body as JSON.
    pub fn json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_slice(&self.body)
    }
}

type RejectFn = dyn Fn(&OutboundMessage<'_>) -> bool + Send + Sync;

/// A broker handle that keeps published messages in memory.
///
/// # Example
///
/// ```rust
/// use cdr_amqp::broker::memory::MemoryBroker;
///
/// let broker = MemoryBroker::new("local");
/// assert!(broker.published().is_empty());
///
/// // Fail every publish routed to "audit"
/// broker.reject_if(|msg| msg.routing_key == "audit");
/// ```
pub struct MemoryBroker {
    name: String,
    published: Mutex<Vec<PublishedMessage>>,
    attempts: AtomicU64,
    reject: RwLock<Option<Box<RejectFn>>>,
}

impl MemoryBroker {
    /// Create an empty broker for the given connection name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            published: Mutex::new(Vec::new()),
            attempts: AtomicU64::new(0),
            reject: RwLock::new(None),
        }
    }

    /// Reject every message matching `predicate` with [`BrokerError::Publish`].
    pub fn reject_if<F>(&self, predicate: F)
    where
        F: Fn(&OutboundMessage<'_>) -> bool + Send + Sync + 'static,
    {
        *self.reject.write() = Some(Box::new(predicate));
    }

    /// Accept every message again.
    pub fn accept_all(&self) {
        *self.reject.write() = None;
    }

    /// Messages accepted so far, in arrival order.
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published.lock().clone()
    }

    /// Number of publish calls, accepted or rejected.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for MemoryBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBroker")
            .field("name", &self.name)
            .field("attempts", &self.attempts())
            .finish()
    }
}

#[async_trait]
impl BrokerHandle for MemoryBroker {
    fn connection_name(&self) -> &str {
        &self.name
    }

    async fn publish(&self, message: OutboundMessage<'_>) -> Result<(), BrokerError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);

        let rejected = self
            .reject
            .read()
            .as_ref()
            .map(|predicate| predicate(&message))
            .unwrap_or(false);
        if rejected {
            return Err(BrokerError::Publish(format!(
                "message to '{}' rejected",
                message.routing_key
            )));
        }

        self.published.lock().push(PublishedMessage {
            exchange: message.exchange.to_string(),
            routing_key: message.routing_key.to_string(),
            mandatory: message.mandatory,
            immediate: message.immediate,
            properties: message.properties.clone(),
            body: message.body.to_vec(),
        });
        Ok(())
    }
}

/// Named registry of [`MemoryBroker`]s acting as a connection provider.
#[derive(Debug, Default)]
pub struct MemoryConnections {
    brokers: RwLock<BTreeMap<String, Arc<MemoryBroker>>>,
    unreachable: RwLock<BTreeSet<String>>,
    requests: AtomicU64,
}

impl MemoryConnections {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh broker under `name`, replacing any previous one.
    pub fn insert(&self, name: &str) -> Arc<MemoryBroker> {
        let broker = Arc::new(MemoryBroker::new(name));
        self.brokers
            .write()
            .insert(name.to_string(), broker.clone());
        broker
    }

    /// Remove the broker registered under `name`.
    pub fn remove(&self, name: &str) -> Option<Arc<MemoryBroker>> {
        self.brokers.write().remove(name)
    }

    /// Make `name` fail to connect (or recover) without unregistering it.
    pub fn set_unreachable(&self, name: &str, unreachable: bool) {
        let mut set = self.unreachable.write();
        if unreachable {
            set.insert(name.to_string());
        } else {
            set.remove(name);
        }
    }

    /// Number of connection requests served, successful or not.
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ConnectionProvider for MemoryConnections {
    async fn get_connection(&self, name: &str) -> Result<Arc<dyn BrokerHandle>, BrokerError> {
        self.requests.fetch_add(1, Ordering::Relaxed);

        if self.unreachable.read().contains(name) {
            return Err(BrokerError::Connection(format!(
                "broker for '{}' is unreachable",
                name
            )));
        }

        match self.brokers.read().get(name) {
            Some(broker) => Ok(broker.clone() as Arc<dyn BrokerHandle>),
            None => Err(BrokerError::UnknownConnection(name.to_string())),
        }
    }
}
