//! Default limits and timings for the shipping pipeline.

use std::time::Duration;

/// Maximum number of records the ingestion buffer holds before the oldest
/// record is evicted. Assuming ~1KB per record this bounds the buffer at
/// roughly 10MB under a sustained outage.
pub(crate) const DEFAULT_CAPACITY: usize = 10_000;

/// Number of records drained into a single transport call.
pub(crate) const DEFAULT_BATCH_SIZE: usize = 100;

/// Delay between flush cycles while the transport is healthy. Also the
/// value the scheduler resets to after a successful nonzero flush.
pub(crate) const DEFAULT_FLOOR_DELAY: Duration = Duration::from_secs(1);

/// Ceiling for the failure-driven backoff delay.
pub(crate) const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);

/// Multiplier applied to the delay on each consecutive failure.
pub(crate) const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// Retry attempts granted to a failed batch before it is dropped.
pub(crate) const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 10;

/// Bounded timeout handed to the transport for a single send.
pub(crate) const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);
