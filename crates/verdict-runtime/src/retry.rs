//! Retry with backoff around the backend-call boundary.
//!
//! Retrying is a capability a stage opts into via its [`RetryPolicy`];
//! the stage contract does not change. Only transport-level failures are
//! retried - a parseable response is a final answer even when the
//! grammar downgrades it.

use backon::{ExponentialBuilder, Retryable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::backend::{BackendError, GenerateRequest, GenerateResponse, InferenceBackend};
use crate::config::duration_str;

/// Retry policy for backend calls. The default performs a single
/// attempt, leaving retries off.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Initial backoff delay
    #[serde(with = "duration_str")]
    pub min_delay: Duration,

    /// Backoff delay ceiling
    #[serde(with = "duration_str")]
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// A policy with retries enabled.
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }
}

/// Execute a generation call under a retry policy.
pub async fn generate_with_retry(
    backend: &dyn InferenceBackend,
    request: &GenerateRequest,
    policy: &RetryPolicy,
) -> Result<GenerateResponse, BackendError> {
    if policy.max_attempts <= 1 {
        return backend.generate(request).await;
    }

    let backoff = ExponentialBuilder::default()
        .with_min_delay(policy.min_delay)
        .with_max_delay(policy.max_delay)
        .with_max_times(policy.max_attempts as usize - 1);

    (|| async { backend.generate(request).await })
        .retry(backoff)
        .when(BackendError::is_transient)
        .notify(|err, delay| {
            tracing::warn!(error = %err, delay = ?delay, "Backend call failed, retrying");
        })
        .await
}
