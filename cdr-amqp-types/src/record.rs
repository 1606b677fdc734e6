//! CallRecord - the per-call metadata produced by the host.

use chrono::{DateTime, Utc};

use crate::{AmaFlags, Disposition};

/// A completed call's detail record.
///
/// The host owns and populates this; exporters only read it. Field names
/// follow the host's CDR column names so that JSON fed to a host binary
/// lines up with what downstream billing systems already expect.
///
/// # Example
///
/// ```rust
/// use cdr_amqp_types::CallRecord;
///
/// let record = CallRecord::builder()
///     .src("100")
///     .dst("200")
///     .uniqueid("1700000000.42")
///     .build();
///
/// assert!(record.answer.is_none());
/// assert_eq!(record.uniqueid, "1700000000.42");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CallRecord {
    /// Caller ID, e.g. `"Alice" <100>`.
    pub clid: String,
    /// Source extension.
    pub src: String,
    /// Destination extension.
    pub dst: String,
    /// Destination context.
    pub dcontext: String,
    /// Originating channel name.
    pub channel: String,
    /// Destination channel name.
    pub dstchannel: String,
    /// Last dialplan application executed.
    pub lastapp: String,
    /// Arguments to the last application.
    pub lastdata: String,

    /// When the call started.
    pub start: DateTime<Utc>,
    /// When the call was answered, if it was.
    pub answer: Option<DateTime<Utc>>,
    /// When the call ended.
    pub end: DateTime<Utc>,
    /// Total call length in seconds.
    pub duration: u64,
    /// Billable (answered) seconds.
    pub billsec: u64,

    /// Final outcome.
    pub disposition: Disposition,
    /// Account code for billing.
    pub accountcode: String,
    /// AMA billing classification.
    pub amaflags: AmaFlags,

    /// Account code of the peer channel.
    pub peeraccount: String,
    /// Unique identifier of the originating channel.
    pub uniqueid: String,
    /// Identifier shared by all channels of a linked call.
    pub linkedid: String,
    /// Free-form annotation set from the dialplan.
    pub userfield: String,
}

impl CallRecord {
    /// Create a builder for constructing records.
    pub fn builder() -> CallRecordBuilder {
        CallRecordBuilder::new()
    }

    /// Whether the call was ever answered.
    pub fn was_answered(&self) -> bool {
        self.answer.is_some()
    }
}

/// Builder for constructing `CallRecord` instances.
///
/// Unset text fields are empty, timestamps default to the epoch and the
/// call is recorded as unanswered.
#[derive(Debug, Default)]
pub struct CallRecordBuilder {
    record: CallRecord,
}

impl CallRecordBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the caller ID.
    pub fn clid(mut self, clid: impl Into<String>) -> Self {
        self.record.clid = clid.into();
        self
    }

    /// Set the source extension.
    pub fn src(mut self, src: impl Into<String>) -> Self {
        self.record.src = src.into();
        self
    }

    /// Set the destination extension.
    pub fn dst(mut self, dst: impl Into<String>) -> Self {
        self.record.dst = dst.into();
        self
    }

    /// Set the destination context.
    pub fn dcontext(mut self, dcontext: impl Into<String>) -> Self {
        self.record.dcontext = dcontext.into();
        self
    }

    /// Set the originating channel name.
    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.record.channel = channel.into();
        self
    }

    /// Set the destination channel name.
    pub fn dstchannel(mut self, dstchannel: impl Into<String>) -> Self {
        self.record.dstchannel = dstchannel.into();
        self
    }

    /// Set the last application and its arguments.
    pub fn last_application(mut self, app: impl Into<String>, data: impl Into<String>) -> Self {
        self.record.lastapp = app.into();
        self.record.lastdata = data.into();
        self
    }

    /// Set the start time.
    pub fn start(mut self, start: DateTime<Utc>) -> Self {
        self.record.start = start;
        self
    }

    /// Set the answer time.
    pub fn answer(mut self, answer: DateTime<Utc>) -> Self {
        self.record.answer = Some(answer);
        self
    }

    /// Set the end time.
    pub fn end(mut self, end: DateTime<Utc>) -> Self {
        self.record.end = end;
        self
    }

    /// Set the total duration in seconds.
    pub fn duration(mut self, secs: u64) -> Self {
        self.record.duration = secs;
        self
    }

    /// Set the billable seconds.
    pub fn billsec(mut self, secs: u64) -> Self {
        self.record.billsec = secs;
        self
    }

    /// Set the disposition.
    pub fn disposition(mut self, disposition: Disposition) -> Self {
        self.record.disposition = disposition;
        self
    }

    /// Set the account code.
    pub fn accountcode(mut self, accountcode: impl Into<String>) -> Self {
        self.record.accountcode = accountcode.into();
        self
    }

    /// Set the AMA flags.
    pub fn amaflags(mut self, amaflags: AmaFlags) -> Self {
        self.record.amaflags = amaflags;
        self
    }

    /// Set the peer account code.
    pub fn peeraccount(mut self, peeraccount: impl Into<String>) -> Self {
        self.record.peeraccount = peeraccount.into();
        self
    }

    /// Set the unique id.
    pub fn uniqueid(mut self, uniqueid: impl Into<String>) -> Self {
        self.record.uniqueid = uniqueid.into();
        self
    }

    /// Set the linked id.
    pub fn linkedid(mut self, linkedid: impl Into<String>) -> Self {
        self.record.linkedid = linkedid.into();
        self
    }

    /// Set the user field.
    pub fn userfield(mut self, userfield: impl Into<String>) -> Self {
        self.record.userfield = userfield.into();
        self
    }

    /// Build the record.
    pub fn build(self) -> CallRecord {
        self.record
    }
}
