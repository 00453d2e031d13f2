//! Record buffering, batching and retry bookkeeping.
//!
//! The [`Collector`] owns two queues. The main buffer is a bounded FIFO
//! that any number of producer threads append to; when it is full the
//! oldest record is evicted so ingestion never blocks or fails the
//! caller. The retry queue holds batches that failed transmission; a
//! flush cycle drains it before touching newly buffered records, keeping
//! delivery roughly chronological across outages.
//!
//! Locks guard only queue mutation and are never held across a transport
//! await: a batch is snapshotted out of the buffer, sent, and on failure
//! pushed onto the retry queue under a fresh lock.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::record::LogRecord;
use crate::transport::{Transport, TransportError};

/// Internal collector fault. Surfaced to the background service as a
/// signaled failure, never as a panic.
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("collector queue lock poisoned")]
    Poisoned,
}

/// A batch that failed transmission, parked for resending.
#[derive(Debug)]
struct RetryEntry {
    batch: Vec<LogRecord>,
    /// Failed sends so far, the initial one included.
    attempts: u32,
    first_failed_at: Instant,
}

/// Outcome of one [`Collector::flush`] cycle.
#[derive(Debug, Default)]
pub struct FlushReport {
    /// Records acknowledged by the transport this cycle.
    pub sent: usize,
    /// The failure that ended or degraded the cycle, if any.
    pub failure: Option<TransportError>,
}

/// Thread-safe ingestion buffer plus retry queue.
///
/// Any thread may [`enqueue`](Collector::enqueue); a single consumer (the
/// background service) calls [`flush`](Collector::flush) and
/// [`flush_retries`](Collector::flush_retries).
pub struct Collector {
    buffer: Mutex<VecDeque<LogRecord>>,
    retries: Mutex<VecDeque<RetryEntry>>,
    closed: AtomicBool,
    capacity: usize,
    batch_size: usize,
    max_retry_attempts: Option<u32>,
}

impl Collector {
    #[must_use]
    pub fn new(config: &PipelineConfig) -> Self {
        Collector {
            buffer: Mutex::new(VecDeque::with_capacity(config.capacity.min(1024))),
            retries: Mutex::new(VecDeque::new()),
            closed: AtomicBool::new(false),
            capacity: config.capacity,
            batch_size: config.batch_size,
            max_retry_attempts: config.max_retry_attempts,
        }
    }

    /// Appends a record to the main buffer. Non-blocking and infallible
    /// for the caller: overflow evicts the oldest record, and records
    /// arriving after [`close`](Collector::close) are dropped.
    pub fn enqueue(&self, record: LogRecord) {
        if self.closed.load(Ordering::Acquire) {
            debug!("collector closed, dropping record");
            return;
        }
        let Ok(mut buffer) = self.buffer.lock() else {
            debug!("collector buffer poisoned, dropping record");
            return;
        };
        if buffer.len() >= self.capacity {
            buffer.pop_front();
            warn!(
                capacity = self.capacity,
                "record buffer full, dropping oldest record"
            );
        }
        buffer.push_back(record);
    }

    /// Stops accepting new records. Idempotent; called when shutdown
    /// begins so the final drain operates on a fixed set.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Records currently waiting in the main buffer.
    pub fn pending(&self) -> usize {
        self.buffer.lock().map(|b| b.len()).unwrap_or(0)
    }

    /// Failed batches currently parked for resending.
    pub fn retry_depth(&self) -> usize {
        self.retries.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Drains the main buffer batch by batch through `transport`.
    ///
    /// Stops at the first retryable failure, parking that batch on the
    /// retry queue; whatever is still buffered waits for the next cycle.
    /// A permanent rejection drops the batch (resending the same payload
    /// cannot succeed) but draining continues. Returns how many records
    /// were acknowledged plus the failure that degraded the cycle, if
    /// any.
    pub async fn flush(&self, transport: &dyn Transport) -> Result<FlushReport, CollectorError> {
        let mut report = FlushReport::default();

        loop {
            let batch = self.next_batch()?;
            if batch.is_empty() {
                break;
            }
            match transport.send(&batch).await {
                Ok(()) => report.sent += batch.len(),
                Err(err) if err.is_retryable() => {
                    debug!(records = batch.len(), error = %err, "batch send failed, parking for retry");
                    self.park(batch)?;
                    report.failure = Some(err);
                    break;
                }
                Err(err) => {
                    warn!(records = batch.len(), error = %err, "batch permanently rejected, dropping");
                    report.failure = Some(err);
                }
            }
        }

        Ok(report)
    }

    /// Walks the retry queue in FIFO order, attempting each entry once.
    ///
    /// Entries that succeed are removed; entries that fail are re-queued
    /// in order with their attempt count bumped, unless the configured
    /// attempt bound is exhausted, in which case the batch is dropped.
    /// Returns the number of records resent.
    pub async fn flush_retries(
        &self,
        transport: &dyn Transport,
    ) -> Result<usize, CollectorError> {
        let depth = self.retries.lock().map_err(|_| CollectorError::Poisoned)?.len();
        let mut resent = 0;

        for _ in 0..depth {
            let entry = {
                let mut retries = self.retries.lock().map_err(|_| CollectorError::Poisoned)?;
                retries.pop_front()
            };
            let Some(mut entry) = entry else { break };

            match transport.send(&entry.batch).await {
                Ok(()) => resent += entry.batch.len(),
                Err(err) if err.is_retryable() => {
                    entry.attempts = entry.attempts.saturating_add(1);
                    if self
                        .max_retry_attempts
                        .is_some_and(|max| entry.attempts >= max)
                    {
                        warn!(
                            records = entry.batch.len(),
                            attempts = entry.attempts,
                            age_secs = entry.first_failed_at.elapsed().as_secs(),
                            "giving up on batch after exhausting retry attempts"
                        );
                    } else {
                        debug!(attempts = entry.attempts, error = %err, "batch retry failed, re-queuing");
                        let mut retries =
                            self.retries.lock().map_err(|_| CollectorError::Poisoned)?;
                        retries.push_back(entry);
                    }
                }
                Err(err) => {
                    warn!(records = entry.batch.len(), error = %err, "retried batch permanently rejected, dropping");
                }
            }
        }

        Ok(resent)
    }

    fn next_batch(&self) -> Result<Vec<LogRecord>, CollectorError> {
        let mut buffer = self.buffer.lock().map_err(|_| CollectorError::Poisoned)?;
        let take = self.batch_size.min(buffer.len());
        Ok(buffer.drain(..take).collect())
    }

    fn park(&self, batch: Vec<LogRecord>) -> Result<(), CollectorError> {
        let mut retries = self.retries.lock().map_err(|_| CollectorError::Poisoned)?;
        retries.push_back(RetryEntry {
            batch,
            attempts: 1,
            first_failed_at: Instant::now(),
        });
        Ok(())
    }
}
