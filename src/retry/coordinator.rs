use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use tokio::time::Instant;
use tracing::warn;

use crate::errors::Error;

use super::{RetryOutcome, plan::RetryPlan};

/// What the coordinator needs to know about a response to decide on a resend.
pub trait RetryableResponse {
    fn status(&self) -> StatusCode;

    /// `Retry-After` in whole seconds, `None` when absent or not an integer.
    fn retry_after_secs(&self) -> Option<u64>;
}

impl RetryableResponse for reqwest::Response {
    fn status(&self) -> StatusCode {
        reqwest::Response::status(self)
    }

    fn retry_after_secs(&self) -> Option<u64> {
        parse_retry_after(self.headers().get(RETRY_AFTER)?.to_str().ok()?)
    }
}

pub fn parse_retry_after(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok()
}

/// Resends an exchange on 429 (honouring `Retry-After`, unbounded) and,
/// when a plan is installed, on 5xx (bounded, fixed delay).
#[derive(Clone, Debug, Default)]
pub struct RetryCoordinator {
    server_errors: Option<RetryPlan>,
}

impl RetryCoordinator {
    pub fn new(server_errors: Option<RetryPlan>) -> Self {
        Self { server_errors }
    }

    pub fn plan(&self) -> Option<&RetryPlan> {
        self.server_errors.as_ref()
    }

    /// Runs `op` until it yields a response that should not be resent.
    /// `op` receives the 1-based attempt number. Transport errors are
    /// returned unchanged without retrying.
    pub async fn execute<F, Fut, R>(&self, mut op: F) -> Result<(R, RetryOutcome), Error>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<R, Error>>,
        R: RetryableResponse,
    {
        let mut attempt: u32 = 1;
        let mut rate_limited: u32 = 0;
        let mut server_errors: u32 = 0;
        let start = Instant::now();
        loop {
            let response = op(attempt).await?;
            let status = response.status();
            let delay = if status == StatusCode::TOO_MANY_REQUESTS {
                match response.retry_after_secs() {
                    Some(secs) => {
                        rate_limited += 1;
                        Some(Duration::from_secs(secs.saturating_add(1)))
                    }
                    None => {
                        warn!(status = %status, attempt, "rate limited without a usable Retry-After; giving up");
                        None
                    }
                }
            } else if status.is_server_error() {
                match &self.server_errors {
                    Some(plan) if server_errors < plan.max_retry_count() => {
                        server_errors += 1;
                        Some(plan.retry_delay())
                    }
                    _ => None,
                }
            } else {
                None
            };

            let Some(delay) = delay else {
                let outcome = RetryOutcome {
                    attempts: attempt,
                    rate_limited,
                    server_errors,
                    final_status: status.as_u16(),
                    total_delay: start.elapsed(),
                };
                if outcome.retried() {
                    outcome.log();
                }
                return Ok((response, outcome));
            };

            warn!(
                status = %status,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "retry.scheduling"
            );
            drop(response);
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
