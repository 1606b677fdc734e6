//! # cdr-amqp-types
//!
//! Call detail record types shared between a telephony host and the
//! `cdr-amqp` export backend. The host populates a [`CallRecord`] when a
//! call completes; the backend only ever borrows it.
//!
//! ## Features
//!
//! - `serde`: derive `Serialize`/`Deserialize` for every type, so hosts can
//!   feed records as JSON. [`Disposition`] and [`AmaFlags`] use their
//!   canonical names on the wire.
//!
//! ## Example
//!
//! ```rust
//! use cdr_amqp_types::{CallRecord, Disposition};
//!
//! let record = CallRecord::builder()
//!     .clid("\"Alice\" <100>")
//!     .src("100")
//!     .dst("200")
//!     .duration(30)
//!     .billsec(25)
//!     .disposition(Disposition::Answered)
//!     .build();
//!
//! assert_eq!(record.disposition.as_str(), "ANSWERED");
//! assert_eq!(record.billsec, 25);
//! ```

mod amaflags;
mod disposition;
mod record;

pub use amaflags::*;
pub use disposition::*;
pub use record::*;

use std::fmt;

/// Error returned when parsing a canonical name that the host does not define.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownName {
    kind: &'static str,
    value: String,
}

impl UnknownName {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }

    /// The rejected input.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for UnknownName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownName {}
