mod coordinator;
mod outcome;
mod plan;

pub use coordinator::{RetryCoordinator, RetryableResponse, parse_retry_after};
pub use outcome::RetryOutcome;
pub use plan::RetryPlan;
