//! Record input for the bundled host binary.
//!
//! The library itself is driven by whatever host owns the calls; this module
//! only exists so the `cdr-amqp` binary can be fed completed records from
//! stdin, a file, or any other byte stream.

mod stream;

pub use stream::RecordStream;
