//! # cdr-amqp
//!
//! A call detail record (CDR) export backend. Each completed call handed to
//! the backend is rendered as a flat JSON document and published to an AMQP
//! exchange, using whatever configuration was current when the call arrived.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          CdrBackend                          │
//! │                                                              │
//! │  log_record ──▶ ConfigStore ──▶ RecordSerializer ──▶ Publisher ──▶ broker
//! │                     ▲                                        │
//! │  initialize/reload  │                                        │
//! │        └──────▶ ConfigLoader ──▶ ConnectionProvider          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`config`]**: settings, immutable [`ConfigSnapshot`]s, the
//!   [`ConfigStore`] that holds the current one and the [`ConfigLoader`]
//!   that builds and installs them
//! - **[`serializer`]**: the JSON document format
//! - **[`publisher`]**: one publish attempt per record
//! - **[`broker`]**: the broker seam, with an AMQP implementation (feature
//!   `amqp`) and an in-memory one for tests
//! - **[`backend`]**: the host entry points
//!
//! A reload never disturbs a call already in flight: every call works from
//! one snapshot, start to finish, and a reload that cannot connect leaves
//! the previous snapshot in place.
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use cdr_amqp::{Activation, CdrBackend, CdrSettings};
//! use cdr_amqp::broker::memory::MemoryConnections;
//! use cdr_amqp_types::{CallRecord, Disposition};
//!
//! # tokio_test::block_on(async {
//! let connections = Arc::new(MemoryConnections::new());
//! let broker = connections.insert("billing");
//!
//! let backend = CdrBackend::new(connections);
//! let settings = CdrSettings {
//!     include_unique_id: true,
//!     ..CdrSettings::with_connection("billing")
//! };
//! assert_eq!(backend.initialize(&settings).await, Activation::Active);
//!
//! let record = CallRecord::builder()
//!     .src("100")
//!     .dst("200")
//!     .disposition(Disposition::Answered)
//!     .uniqueid("1435141273.1")
//!     .build();
//! backend.log_record(&record).await.unwrap();
//!
//! let body = broker.published()[0].json().unwrap();
//! assert_eq!(body["disposition"], "ANSWERED");
//! assert_eq!(body["uniqueid"], "1435141273.1");
//! # });
//! ```
//!
//! ### Against a real broker
//!
//! ```no_run
//! use std::sync::Arc;
//! use cdr_amqp::{BackendFile, CdrBackend};
//! use cdr_amqp::broker::amqp::AmqpConnections;
//!
//! # tokio_test::block_on(async {
//! let file = BackendFile::load("cdr_amqp.toml".as_ref()).unwrap();
//! let connections = Arc::new(AmqpConnections::new(file.connections.clone()));
//! let backend = CdrBackend::new(connections.clone());
//! backend.initialize(&file.global).await;
//! # });
//! ```

pub mod backend;
pub mod broker;
pub mod config;
pub mod error;
pub mod publisher;
pub mod serializer;
pub mod source;
pub mod telemetry;

// Re-export main types for convenience
pub use backend::{Activation, CdrBackend, BACKEND_DESCRIPTION, BACKEND_NAME};
pub use broker::{BrokerHandle, ConnectionProvider, DeliveryMode, DeliveryProperties};
pub use config::{
    BackendFile, CdrSettings, ConfigLoader, ConfigSnapshot, ConfigStore, ConnectionSettings,
};
pub use error::{BrokerError, PipelineError};
pub use publisher::Publisher;
pub use serializer::{PublishedDocument, RecordSerializer};

pub use cdr_amqp_types;
