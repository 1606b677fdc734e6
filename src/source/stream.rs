//! Stream-based record source.
//!
//! Receives completed call records as newline-delimited JSON from an async
//! byte stream.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use cdr_amqp_types::CallRecord;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

const CHANNEL_CAPACITY: usize = 64;

/// Records read from an async stream.
///
/// A background task reads one JSON object per line and hands parsed
/// records out through [`next`](RecordStream::next). Blank lines are
/// ignored; malformed lines, including invalid UTF-8, are counted, logged
/// and skipped.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use cdr_amqp::source::RecordStream;
///
/// # tokio_test::block_on(async {
/// let data = b"{\"src\":\"100\",\"dst\":\"200\"}\n";
/// let mut stream = RecordStream::spawn(Cursor::new(data.to_vec()), "example");
/// let record = stream.next().await.unwrap();
/// assert_eq!(record.src, "100");
/// assert!(stream.next().await.is_none());
/// # });
/// ```
#[derive(Debug)]
pub struct RecordStream {
    receiver: mpsc::Receiver<CallRecord>,
    description: String,
    malformed: Arc<AtomicU64>,
    last_error: Arc<Mutex<Option<String>>>,
}

impl RecordStream {
    /// Spawn a background task that reads from the given async reader.
    pub fn spawn<R>(reader: R, description: &str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let malformed = Arc::new(AtomicU64::new(0));
        let last_error = Arc::new(Mutex::new(None));
        let malformed_handle = malformed.clone();
        let error_handle = last_error.clone();
        let desc = description.to_string();

        tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut line = Vec::new();
            let mut line_number = 0u64;

            loop {
                line.clear();
                match reader.read_until(b'\n', &mut line).await {
                    Ok(0) => {
                        debug!(source = %desc, lines = line_number, "record stream closed");
                        break;
                    }
                    Ok(_) => {
                        line_number += 1;
                        if line.iter().all(u8::is_ascii_whitespace) {
                            continue;
                        }
                        match serde_json::from_slice::<CallRecord>(&line) {
                            Ok(record) => {
                                if tx.send(record).await.is_err() {
                                    // Receiver dropped
                                    break;
                                }
                            }
                            Err(e) => {
                                malformed_handle.fetch_add(1, Ordering::Relaxed);
                                warn!(source = %desc, line = line_number, error = %e, "skipping malformed record");
                                *error_handle.lock() = Some(format!("Parse error on line {}: {}", line_number, e));
                            }
                        }
                    }
                    Err(e) => {
                        warn!(source = %desc, error = %e, "record stream read failed");
                        *error_handle.lock() = Some(format!("Read error: {}", e));
                        break;
                    }
                }
            }
        });

        Self {
            receiver: rx,
            description: format!("stream: {}", description),
            malformed,
            last_error,
        }
    }

    /// Wait for the next record. `None` once the stream is exhausted.
    pub async fn next(&mut self) -> Option<CallRecord> {
        self.receiver.recv().await
    }

    /// Human-readable description of the source.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Number of lines that could not be parsed.
    pub fn malformed(&self) -> u64 {
        self.malformed.load(Ordering::Relaxed)
    }

    /// The last parse or read error, if any.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }
}
