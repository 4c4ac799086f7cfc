//! Chart host interface and bootstrap.
//!
//! The chart itself is drawn by an external host. Before the first frame
//! the host's charting library has to be loaded once and its container has
//! to be laid out; [`ChartBootstrap`] drives both steps.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::chart::ChartFrame;
use crate::error::{Error, Result};

/// Host that draws chart frames.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChartHost: Send + Sync {
    /// Load the charting library. Called once per bootstrap.
    async fn load_library(&self) -> Result<()>;

    /// Check if the chart container has been laid out.
    fn container_ready(&self) -> bool;

    /// Draw a frame.
    fn render(&self, frame: &ChartFrame);
}

/// Layout retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound of the doubling delay.
    pub max_delay: Duration,
    /// Number of layout checks before giving up.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
            max_attempts: 10,
        }
    }
}

impl RetryPolicy {
    /// Delay after the given (1-based) failed attempt.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// One-time chart creation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChartBootstrap {
    policy: RetryPolicy,
}

impl ChartBootstrap {
    /// Create a bootstrap with a custom retry policy.
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// The retry policy.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Load the library, then wait for the container to be laid out.
    ///
    /// A library load failure is not retried. A container that never gets
    /// laid out is retried with a doubling delay until the policy's attempt
    /// budget is spent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChartBootstrap`] if the chart cannot be created; the
    /// rest of the card keeps working without it.
    pub async fn run(&self, host: &dyn ChartHost) -> Result<()> {
        host.load_library().await.map_err(|e| {
            warn!("Failed to load chart library: {}", e);
            Error::ChartBootstrap {
                reason: e.to_string(),
            }
        })?;
        debug!("Chart library loaded");

        let mut attempts = 0;
        while attempts < self.policy.max_attempts {
            attempts += 1;

            if host.container_ready() {
                info!("Chart ready after {} layout check(s)", attempts);
                return Ok(());
            }

            let delay = self.policy.delay(attempts);
            debug!(
                "Chart container not laid out (attempt {} of {}), retrying in {:?}",
                attempts, self.policy.max_attempts, delay
            );
            if attempts < self.policy.max_attempts {
                tokio::time::sleep(delay).await;
            }
        }

        warn!("Chart container never laid out, giving up");
        Err(Error::ChartBootstrap {
            reason: format!("container not laid out after {} attempts", attempts),
        })
    }
}
