//! Bounded retry policy for the Graph API client.
//!
//! Only two conditions are retried: HTTP 429 (wait for `Retry-After`, or the
//! default delay when the header is missing or unreadable) and transport
//! failures (wait the default delay). Everything else fails immediately.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use tokio::sync::Mutex;

/// Something that can wait. Production code uses [`TokioSleeper`]; tests use
/// [`RecordingSleeper`] to observe the requested delays without waiting.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Records every requested delay and returns immediately.
#[derive(Clone, Debug, Default)]
pub struct RecordingSleeper {
    calls: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn calls(&self) -> Vec<Duration> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.calls.lock().await.push(duration);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    /// Wait after a transport failure, and after a 429 without `Retry-After`.
    pub default_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            default_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Delay requested by a rate-limited response.
    ///
    /// Only the delta-seconds form of `Retry-After` is understood.
    pub fn retry_after(&self, headers: &HeaderMap) -> Duration {
        headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(self.default_delay)
    }
}
