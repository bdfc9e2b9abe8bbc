use std::time::Duration;

use tracing::Level;
use tracing::event;

#[derive(Debug, Clone)]
pub struct RetryOutcome {
    pub attempts: u32,
    pub rate_limited: u32,
    pub server_errors: u32,
    pub final_status: u16,
    pub total_delay: Duration,
}

impl RetryOutcome {
    pub fn retried(&self) -> bool {
        self.attempts > 1
    }

    pub fn log(&self) {
        event!(
            Level::INFO,
            attempts = self.attempts,
            rate_limited = self.rate_limited,
            server_errors = self.server_errors,
            final_status = self.final_status,
            total_delay_ms = self.total_delay.as_millis() as u64,
            "retry.outcome"
        );
    }
}
