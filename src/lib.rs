//! # Station Auth Library
//!
//! Provides machine-to-machine OAuth2 tokens for calls to downstream services,
//! caching them per audience, refreshing them ahead of expiry, and decoding
//! the policy actor carried in their claims.
//!
//! Modules:
//! - `cache` — stored token value object and the process-wide token cache
//! - `sources` — token provider contract and the Auth0 client
//! - `auth` — token service policy, claims validation, policy actor
//! - `client` — HTTP client wrapper setting the Authorization header
//! - `config` — service configuration, loading and validation

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod errors;
pub mod helpers;
pub mod observability;
pub mod server;
pub mod sources;
pub mod utils;

#[cfg(test)]
pub mod tests;

pub use crate::auth::service::TokenService;
pub use crate::cache::{stored_token::StoredToken, token_cache::TokenCache};
pub use crate::config::services::ServiceConfig;
pub use crate::errors::{AuthError, AuthResult};
