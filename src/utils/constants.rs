//! Shared constants and invariants

/// Tokens are treated as expired this long before the provider's expiry.
pub const EXPIRATION_OFFSET_MS: u64 = 60_000;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;

pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";

// Auth0 endpoints, relative to the tenant domain
pub const OAUTH_TOKEN_PATH: &str = "/oauth/token";
pub const JWKS_PATH: &str = "/.well-known/jwks.json";
/// Unknown `kid`s refetch the key set no more often than this.
pub const JWKS_MIN_REFETCH_INTERVAL_SECS: u64 = 30;

// Grant types
pub const GRANT_CLIENT_CREDENTIALS: &str = "client_credentials";
pub const GRANT_REFRESH_TOKEN: &str = "refresh_token";

// Policy actor claims
pub const DEFAULT_TYPE_CLAIM: &str = "type";
pub const DEFAULT_PROPERTIES_CLAIM: &str = "props";
