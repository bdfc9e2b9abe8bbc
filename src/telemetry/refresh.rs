use std::time::Instant;

use tracing::{Level, event};
use uuid::Uuid;

#[derive(Clone, Debug)]
pub enum RefreshOutcome {
    Success,
    Rejected,
    Unparsable,
    Unreachable,
}

/// Tags every event of one authentication attempt with the same id.
#[derive(Clone, Debug)]
pub struct RefreshTelemetry {
    attempt_id: Uuid,
    context: String,
    started: Instant,
}

impl RefreshTelemetry {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            attempt_id: Uuid::new_v4(),
            context: context.into(),
            started: Instant::now(),
        }
    }

    pub fn emit_start(&self, token_is_stale: bool) {
        event!(
            Level::INFO,
            attempt_id = %self.attempt_id,
            context = %self.context,
            token_is_stale,
            "refresh.start"
        );
    }

    pub fn emit_success(&self, expires_in: u64) {
        event!(
            Level::INFO,
            attempt_id = %self.attempt_id,
            context = %self.context,
            outcome = ?RefreshOutcome::Success,
            expires_in,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "refresh.success"
        );
    }

    pub fn emit_failure(&self, outcome: RefreshOutcome, detail: &str) {
        event!(
            Level::WARN,
            attempt_id = %self.attempt_id,
            context = %self.context,
            outcome = ?outcome,
            detail,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "refresh.failure"
        );
    }
}
