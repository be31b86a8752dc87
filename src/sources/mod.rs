//! Sources module
//!
//! Token providers: the contract the token service mints and refreshes
//! through, and the Auth0 implementation of it.

use std::future::Future;

use serde::Deserialize;

use crate::errors::AuthResult;
use crate::utils::constants::DEFAULT_TOKEN_TYPE;

pub mod auth0;

/// Raw token endpoint response.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime in seconds.
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

fn default_token_type() -> String {
    DEFAULT_TOKEN_TYPE.to_owned()
}

/// OAuth2 client able to mint and refresh machine-to-machine tokens.
pub trait TokenProvider: Send + Sync {
    fn client_credentials_grant(
        &self,
        audience: &str,
    ) -> impl Future<Output = AuthResult<TokenResponse>> + Send;

    fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = AuthResult<TokenResponse>> + Send;
}
