//! Transport port: the seam between the pipeline and the wire.
//!
//! The collector and background service only ever talk to this trait. A
//! batch is either fully accepted (`Ok`) or reported failed in its
//! entirety (`Err`) so the retry queue never has to reason about partial
//! acceptance. Implementations own a bounded per-request timeout; a single
//! slow send must not stall the scheduler indefinitely.

use async_trait::async_trait;

use crate::record::LogRecord;

/// Failure to deliver a batch.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The send exceeded the transport's bounded timeout.
    #[error("send timed out")]
    Timeout,

    /// The collector rejected the batch permanently (client error).
    /// Retrying the same payload will not help.
    #[error("batch rejected with status {status}")]
    Rejected { status: u16 },

    /// The collector answered with a retryable error status.
    #[error("send failed with status {status}")]
    Status { status: u16 },

    /// The request never reached the collector.
    #[error("network error: {0}")]
    Network(String),
}

impl TransportError {
    /// Whether resending the same batch can be expected to succeed later.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportError::Rejected { .. })
    }
}

/// Delivery mechanism for one batch of records.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, batch: &[LogRecord]) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_is_not_retryable() {
        assert!(!TransportError::Rejected { status: 400 }.is_retryable());
        assert!(TransportError::Status { status: 503 }.is_retryable());
        assert!(TransportError::Timeout.is_retryable());
        assert!(TransportError::Network("refused".to_string()).is_retryable());
    }
}
