//! Transient error classification and retry with a wall-clock budget.
//!
//! ARM reports some conditions that resolve on their own, most notably
//! `ReferencedResourceNotProvisioned`: a dependency created moments ago has
//! not finished propagating. Those are retried with exponential backoff
//! until a fixed budget (300 seconds by default) runs out. Everything else
//! fails immediately.

use std::future::Future;
use std::time::Duration;

use backoff::{ExponentialBackoff, ExponentialBackoffBuilder, backoff::Backoff};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Error code returned while a referenced resource is still provisioning.
pub const REFERENCED_RESOURCE_NOT_PROVISIONED: &str = "ReferencedResourceNotProvisioned";

/// Whether a failed request is worth repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Repeating the request may succeed
    Retryable,
    /// Repeating the request will fail the same way
    Fatal,
}

/// Classifies an API failure from its status code and body.
#[must_use]
pub fn classify(status: u16, body: &str) -> Disposition {
    match status {
        400 if body.contains(REFERENCED_RESOURCE_NOT_PROVISIONED) => Disposition::Retryable,
        408 | 429 | 500 | 502 | 503 | 504 => Disposition::Retryable,
        _ => Disposition::Fatal,
    }
}

/// Retry behaviour for transient API errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total wall-clock budget for retries, in seconds
    pub budget_secs: u64,
    /// Initial backoff in milliseconds
    pub initial_backoff_ms: u64,
    /// Maximum backoff in milliseconds
    pub max_backoff_ms: u64,
    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            budget_secs: 300,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// The retry budget as a [`Duration`].
    #[must_use]
    pub const fn budget(&self) -> Duration {
        Duration::from_secs(self.budget_secs)
    }
}

fn create_backoff(config: &RetryConfig) -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(config.initial_backoff_ms))
        .with_max_interval(Duration::from_millis(config.max_backoff_ms))
        .with_multiplier(config.backoff_multiplier)
        .with_max_elapsed_time(Some(config.budget()))
        .build()
}

/// Runs `f` until it succeeds, fails fatally, or the retry budget runs out.
///
/// Errors for which [`Error::is_retryable`] is false are returned as-is on
/// the first occurrence.
///
/// # Errors
///
/// Returns the first fatal error, or [`Error::RetryExhausted`] carrying the
/// last transient error once the budget is spent.
pub async fn retry_transient<F, Fut, T>(config: &RetryConfig, operation: &str, mut f: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut backoff = create_backoff(config);
    let mut attempts = 0u32;

    loop {
        attempts += 1;

        let err = match f().await {
            Ok(value) => {
                if attempts > 1 {
                    debug!(operation, attempts, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !err.is_retryable() {
            debug!(operation, error = %err, "Error is not retryable, failing immediately");
            return Err(err);
        }

        let Some(delay) = backoff.next_backoff() else {
            warn!(operation, attempts, error = %err, "Retry budget exhausted");
            return Err(Error::RetryExhausted {
                operation: operation.to_string(),
                attempts,
                last_error: err.to_string(),
            });
        };

        warn!(
            operation,
            attempts,
            error = %err,
            retry_in_ms = delay.as_millis(),
            "Transient error, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_config() -> RetryConfig {
        RetryConfig {
            budget_secs: 1,
            initial_backoff_ms: 5,
            max_backoff_ms: 20,
            backoff_multiplier: 2.0,
        }
    }

    fn not_provisioned() -> Error {
        Error::api(
            "creating peering",
            ApiError::from_response(
                400,
                r#"{"error":{"code":"ReferencedResourceNotProvisioned","message":"Cannot proceed with operation because resource vnet1 is not in Succeeded state."}}"#,
            ),
        )
    }

    #[test]
    fn test_classify_not_provisioned_is_retryable() {
        let body = r#"{"error":{"code":"ReferencedResourceNotProvisioned","message":"still provisioning"}}"#;
        assert_eq!(classify(400, body), Disposition::Retryable);
    }

    #[test]
    fn test_classify_other_bad_request_is_fatal() {
        let body = r#"{"error":{"code":"InvalidParameter","message":"bad cidr"}}"#;
        assert_eq!(classify(400, body), Disposition::Fatal);
    }

    #[test]
    fn test_classify_forbidden_and_not_found_are_fatal() {
        let body = r#"{"error":{"code":"ReferencedResourceNotProvisioned","message":"x"}}"#;
        assert_eq!(classify(403, body), Disposition::Fatal);
        assert_eq!(classify(404, body), Disposition::Fatal);
        assert_eq!(classify(404, ""), Disposition::Fatal);
    }

    #[test]
    fn test_classify_throttling_and_server_errors() {
        for status in [408, 429, 500, 502, 503, 504] {
            assert_eq!(classify(status, ""), Disposition::Retryable, "status {status}");
        }
        assert_eq!(classify(501, ""), Disposition::Fatal);
    }

    #[tokio::test]
    async fn test_retry_until_provisioned() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        let result = retry_transient(&fast_config(), "creating peering", move || {
            let calls = Arc::clone(&calls_clone);
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(not_provisioned())
                } else {
                    Ok("created")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "created");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fatal_error_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        let result: Result<()> = retry_transient(&fast_config(), "creating peering", move || {
            let calls = Arc::clone(&calls_clone);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::api("creating peering", ApiError::from_response(403, "{}")))
            }
        })
        .await;

        assert!(matches!(result, Err(Error::Api { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_budget_exhaustion() {
        let config = RetryConfig {
            budget_secs: 0,
            ..fast_config()
        };

        let result: Result<()> =
            retry_transient(&config, "creating peering", || async { Err(not_provisioned()) }).await;

        match result {
            Err(Error::RetryExhausted { attempts, last_error, .. }) => {
                assert!(attempts >= 1);
                assert!(last_error.contains("ReferencedResourceNotProvisioned"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
