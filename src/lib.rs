mod client;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod retry;
pub mod spotify;
pub mod telemetry;
pub mod token;
pub mod types;

pub use client::{ApiClient, RequestAuthenticator};
pub use config::Config;
pub use credentials::{Credentials, encode_base64};
pub use errors::Error;
pub use spotify::SpotifyClient;
pub use token::{CachedToken, Clock, ManualClock, MonotonicClock, TokenProvider};
