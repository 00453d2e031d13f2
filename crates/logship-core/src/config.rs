//! Pipeline configuration.

use std::env;
use std::time::Duration;

use crate::constants;

/// Configuration rejected by [`PipelineConfig::validate`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Tuning knobs for the shipping pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Ingestion buffer bound; the oldest record is dropped on overflow.
    pub capacity: usize,
    /// Records drained into a single transport call.
    pub batch_size: usize,
    /// Delay between flush cycles while sends succeed.
    pub floor_delay: Duration,
    /// Ceiling for the failure-driven backoff delay.
    pub max_delay: Duration,
    /// Multiplier applied to the delay per consecutive failure.
    pub backoff_factor: f64,
    /// Resend attempts granted to a failed batch before it is dropped.
    /// `None` retries forever.
    pub max_retry_attempts: Option<u32>,
    /// Bounded timeout for a single transport send.
    pub flush_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            capacity: constants::DEFAULT_CAPACITY,
            batch_size: constants::DEFAULT_BATCH_SIZE,
            floor_delay: constants::DEFAULT_FLOOR_DELAY,
            max_delay: constants::DEFAULT_MAX_DELAY,
            backoff_factor: constants::DEFAULT_BACKOFF_FACTOR,
            max_retry_attempts: Some(constants::DEFAULT_MAX_RETRY_ATTEMPTS),
            flush_timeout: constants::DEFAULT_FLUSH_TIMEOUT,
        }
    }
}

impl PipelineConfig {
    /// Builds the configuration from `LOGSHIP_*` environment variables,
    /// falling back to the defaults for anything unset or unparsable.
    /// `LOGSHIP_MAX_RETRY_ATTEMPTS=0` disables the retry bound.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = PipelineConfig::default();

        let capacity = env::var("LOGSHIP_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults.capacity);
        let batch_size = env::var("LOGSHIP_BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults.batch_size);
        let floor_delay = env::var("LOGSHIP_FLOOR_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map_or(defaults.floor_delay, Duration::from_millis);
        let max_delay = env::var("LOGSHIP_MAX_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map_or(defaults.max_delay, Duration::from_millis);
        let backoff_factor = env::var("LOGSHIP_BACKOFF_FACTOR")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(defaults.backoff_factor);
        let max_retry_attempts = match env::var("LOGSHIP_MAX_RETRY_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
        {
            Some(0) => None,
            Some(n) => Some(n),
            None => defaults.max_retry_attempts,
        };
        let flush_timeout = env::var("LOGSHIP_FLUSH_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map_or(defaults.flush_timeout, Duration::from_millis);

        let config = PipelineConfig {
            capacity,
            batch_size,
            floor_delay,
            max_delay,
            backoff_factor,
            max_retry_attempts,
            flush_timeout,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Invalid(
                "buffer capacity must be greater than 0".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "batch size must be greater than 0".to_string(),
            ));
        }
        if self.floor_delay.is_zero() {
            return Err(ConfigError::Invalid(
                "floor delay must be greater than 0".to_string(),
            ));
        }
        if self.max_delay < self.floor_delay {
            return Err(ConfigError::Invalid(
                "max delay must not be below the floor delay".to_string(),
            ));
        }
        if self.backoff_factor < 1.0 {
            return Err(ConfigError::Invalid(
                "backoff factor must be at least 1.0".to_string(),
            ));
        }
        if self.flush_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "flush timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
