use http::StatusCode;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

/// Failures surfaced by token acquisition and claims handling.
///
/// Nothing here is recovered locally; callers map these to their own
/// response codes.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required configuration value is missing or inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// The token endpoint answered with a non-success status.
    #[error("token grant '{grant}' rejected with status {status}: {body}")]
    GrantRejected {
        grant: &'static str,
        status: StatusCode,
        body: String,
    },

    /// Transport failure talking to the token or JWKS endpoint.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Signature or registered claims did not validate.
    #[error("token claims invalid: {0}")]
    Claims(#[from] jsonwebtoken::errors::Error),

    /// The signing key set could not be used to validate a token.
    #[error("jwks error: {0}")]
    Jwks(String),

    /// Custom policy claims could not be decoded.
    #[error("policy actor claims invalid: {0}")]
    Actor(#[from] serde_json::Error),
}
