// dlpsync-api: Async Rust client for the DLP data-pattern / data-profile API

pub mod auth;
pub mod client;
pub mod error;
pub mod transport;
mod types;

pub use auth::{AccessToken, ClientCredentials, DEFAULT_AUTH_URL, request_access_token};
pub use client::{
    CLIENT_IDENTITY, DEFAULT_DATA_PATTERN_URL, DEFAULT_DATA_PROFILE_URL, DlpClient, Endpoints,
};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
