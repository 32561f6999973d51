use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first one)
    pub max_attempts: u32,
    /// Delay before each retry
    pub delay: Duration,
}

impl RetryConfig {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Preset: retry storage reads once after a short pause.
    pub fn read_once() -> Self {
        Self::new(2, Duration::from_millis(100))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::read_once()
    }
}

/// Execute an operation with retries.
///
/// Only retryable errors (storage and I/O) are attempted again; validation,
/// not-found, and authentication errors propagate immediately since retrying
/// them cannot change the outcome.
///
/// # Panics
/// Panics if `config.max_attempts` is 0
pub fn with_retry<T, F>(config: &RetryConfig, operation_name: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    assert!(
        config.max_attempts >= 1,
        "RetryConfig.max_attempts must be >= 1, got {}",
        config.max_attempts
    );

    let mut last_error: Option<Error> = None;

    for attempt in 0..config.max_attempts {
        if attempt > 0 {
            debug!(
                operation = operation_name,
                attempt = attempt + 1,
                "Retrying after {:?}",
                config.delay
            );
            std::thread::sleep(config.delay);
        }

        match operation() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt + 1 < config.max_attempts => {
                warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    error = %e,
                    "Operation failed, will retry"
                );
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_error.expect("At least one attempt should have been made"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn storage_error() -> Error {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "transient",
        ))
    }

    #[test]
    fn test_success_on_first_attempt() {
        let calls = Cell::new(0);
        let result = with_retry(&RetryConfig::read_once(), "test", || {
            calls.set(calls.get() + 1);
            Ok(42)
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_retries_transient_storage_error_once() {
        let calls = Cell::new(0);
        let result = with_retry(&RetryConfig::read_once(), "test", || {
            calls.set(calls.get() + 1);
            if calls.get() == 1 {
                Err(storage_error())
            } else {
                Ok("recovered")
            }
        });
        assert_eq!(result.unwrap(), "recovered");
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let calls = Cell::new(0);
        let result: Result<()> = with_retry(&RetryConfig::read_once(), "test", || {
            calls.set(calls.get() + 1);
            Err(storage_error())
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_validation_errors_are_not_retried() {
        let calls = Cell::new(0);
        let result: Result<()> = with_retry(&RetryConfig::read_once(), "test", || {
            calls.set(calls.get() + 1);
            Err(Error::validation("bad input"))
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 1, "non-retryable error must not be retried");
    }

    #[test]
    #[should_panic(expected = "max_attempts must be >= 1")]
    fn test_zero_attempts_panics() {
        let config = RetryConfig::new(0, Duration::from_millis(1));
        let _: Result<()> = with_retry(&config, "test", || Ok(()));
    }
}
