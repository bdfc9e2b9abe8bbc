use std::time::Duration;

use crate::errors::Error;

/// Bounded resend plan for upstream 5xx responses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPlan {
    max_retry_count: u32,
    retry_delay: Duration,
}

impl RetryPlan {
    pub const DEFAULT_RETRY_COUNT: u32 = 2;
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

    pub fn new(max_retry_count: u32, retry_delay: Duration) -> Result<Self, Error> {
        if retry_delay.is_zero() {
            return Err(Error::Config("Retry delay must be > 0".into()));
        }
        Ok(Self {
            max_retry_count,
            retry_delay,
        })
    }

    /// Extra attempts after the original request.
    pub fn max_retry_count(&self) -> u32 {
        self.max_retry_count
    }

    /// Fixed wait before each resend.
    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    pub fn default_plan() -> Self {
        Self {
            max_retry_count: Self::DEFAULT_RETRY_COUNT,
            retry_delay: Self::DEFAULT_RETRY_DELAY,
        }
    }
}

impl Default for RetryPlan {
    fn default() -> Self {
        Self::default_plan()
    }
}
