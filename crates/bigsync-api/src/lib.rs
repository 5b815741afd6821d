// bigsync-api: Async Rust client for the BIG-IP iControl REST API

pub mod auth;
pub mod error;
pub mod rest;
pub mod transport;

pub use auth::Credentials;
pub use error::Error;
pub use rest::RestClient;
