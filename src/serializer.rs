//! Record serialization.
//!
//! Maps a [`CallRecord`] to the JSON document consumers receive. The set
//! of keys is fixed; two optional keys are appended only when the snapshot
//! enables them, and are left out entirely otherwise.

use cdr_amqp_types::CallRecord;
use chrono::{DateTime, Utc};
use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::config::ConfigSnapshot;
use crate::error::PipelineError;

/// Keys present in every document, in emission order.
pub const REQUIRED_KEYS: [&str; 18] = [
    "clid",
    "src",
    "dst",
    "dcontext",
    "channel",
    "dstchannel",
    "lastapp",
    "lastdata",
    "start",
    "answer",
    "end",
    "durationsec",
    "billsec",
    "disposition",
    "accountcode",
    "amaflags",
    "peeraccount",
    "linkedid",
];

/// Key emitted when the snapshot enables unique ids.
pub const UNIQUE_ID_KEY: &str = "uniqueid";

/// Key emitted when the snapshot enables the user field.
pub const USER_FIELD_KEY: &str = "userfield";

/// ISO-8601 with milliseconds and a numeric offset, e.g.
/// `2015-06-24T10:21:43.123+0000`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

struct Timestamp(DateTime<Utc>);

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0.format(TIMESTAMP_FORMAT))
    }
}

#[derive(Serialize)]
struct CdrDocument<'a> {
    clid: &'a str,
    src: &'a str,
    dst: &'a str,
    dcontext: &'a str,
    channel: &'a str,
    dstchannel: &'a str,
    lastapp: &'a str,
    lastdata: &'a str,
    start: Timestamp,
    answer: Timestamp,
    end: Timestamp,
    durationsec: u64,
    billsec: u64,
    disposition: &'static str,
    accountcode: &'a str,
    amaflags: &'static str,
    peeraccount: &'a str,
    linkedid: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    uniqueid: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    userfield: Option<&'a str>,
}

/// A serialized record, ready to publish.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedDocument {
    fields: Map<String, Value>,
    body: Vec<u8>,
}

impl PublishedDocument {
    /// The document's fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Look up a single field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the document has no keys.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Compact JSON bytes, keys in [`REQUIRED_KEYS`] order followed by the
    /// enabled optional keys.
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Renders call records as JSON documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordSerializer;

impl RecordSerializer {
    /// Create a serializer.
    pub fn new() -> Self {
        Self
    }

    /// Serialize `record` under the flags of `snapshot`.
    ///
    /// An unanswered call renders its answer time as the epoch.
    pub fn serialize(
        &self,
        record: &CallRecord,
        snapshot: &ConfigSnapshot,
    ) -> Result<PublishedDocument, PipelineError> {
        let document = CdrDocument {
            clid: &record.clid,
            src: &record.src,
            dst: &record.dst,
            dcontext: &record.dcontext,
            channel: &record.channel,
            dstchannel: &record.dstchannel,
            lastapp: &record.lastapp,
            lastdata: &record.lastdata,
            start: Timestamp(record.start),
            answer: Timestamp(record.answer.unwrap_or_default()),
            end: Timestamp(record.end),
            durationsec: record.duration,
            billsec: record.billsec,
            disposition: record.disposition.as_str(),
            accountcode: &record.accountcode,
            amaflags: record.amaflags.as_str(),
            peeraccount: &record.peeraccount,
            linkedid: &record.linkedid,
            uniqueid: snapshot
                .include_unique_id()
                .then_some(record.uniqueid.as_str()),
            userfield: snapshot
                .include_user_field()
                .then_some(record.userfield.as_str()),
        };

        let body = serde_json::to_vec(&document)?;
        let fields = match serde_json::to_value(&document)? {
            Value::Object(fields) => fields,
            _ => {
                return Err(PipelineError::Encoding(serde_json::Error::custom(
                    "record did not serialize to an object",
                )))
            }
        };

        Ok(PublishedDocument { fields, body })
    }
}
