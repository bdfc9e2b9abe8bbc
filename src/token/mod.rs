mod clock;
mod envelope;
mod provider;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use envelope::{CachedToken, TokenResponse};
pub use provider::TokenProvider;
