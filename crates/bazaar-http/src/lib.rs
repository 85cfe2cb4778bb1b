//! bazaar-http - Authenticated storefront API client.
//!
//! Every outbound call goes through [`ApiClient`], which attaches the stored
//! access token and recovers from expired tokens with a single coordinated
//! refresh shared by all concurrently failing requests.

mod client;
mod config;
mod endpoints;
mod refresh;
mod request;
pub mod sources;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use refresh::{RefreshCoordinator, SessionEvent};
pub use request::{ApiRequest, ApiResponse};
pub use reqwest::Method;
