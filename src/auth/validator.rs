//! Claims validation behind a small trait, so the token service never deals
//! with JWT cryptography directly.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use jsonwebtoken::jwk::{Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::errors::{AuthError, AuthResult};
use crate::sources::auth0::base_url;
use crate::utils::constants::{JWKS_MIN_REFETCH_INTERVAL_SECS, JWKS_PATH};

/// Expected `aud` and `iss` of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOptions {
    pub audience: String,
    pub issuer: String,
}

/// Payload of a validated token: registered claims plus everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedClaims {
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
    /// String or array, as issued.
    #[serde(default)]
    pub aud: Option<Value>,
    #[serde(default)]
    pub exp: Option<u64>,
    #[serde(default)]
    pub iat: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DecodedClaims {
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }
}

pub trait ClaimsValidator: Send + Sync {
    fn validate(
        &self,
        token: &str,
        options: &ValidationOptions,
    ) -> impl Future<Output = AuthResult<DecodedClaims>> + Send;
}

fn validation_for(algorithm: Algorithm, options: &ValidationOptions) -> Validation {
    let mut validation = Validation::new(algorithm);
    validation.set_audience(&[options.audience.as_str()]);
    validation.set_issuer(&[options.issuer.as_str()]);
    validation
}

/// HS256 validation against a shared secret.
#[derive(Clone)]
pub struct SharedSecretValidator {
    key: DecodingKey,
}

impl SharedSecretValidator {
    pub fn new(secret: &[u8]) -> Self {
        Self { key: DecodingKey::from_secret(secret) }
    }
}

impl ClaimsValidator for SharedSecretValidator {
    async fn validate(&self, token: &str, options: &ValidationOptions) -> AuthResult<DecodedClaims> {
        let validation = validation_for(Algorithm::HS256, options);
        Ok(decode::<DecodedClaims>(token, &self.key, &validation)?.claims)
    }
}

impl fmt::Debug for SharedSecretValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSecretValidator").field("key", &"[REDACTED]").finish()
    }
}

/// Validates tokens against the tenant's published JSON Web Key Set.
///
/// The key set is fetched lazily and kept for the process lifetime. An unknown
/// `kid` triggers a refetch to pick up rotated keys, at most once per
/// `min_refetch_interval`.
pub struct JwksValidator {
    jwks_url: String,
    client: Client,
    min_refetch_interval: Duration,
    keys: RwLock<KeySetCache>,
}

#[derive(Default)]
struct KeySetCache {
    key_set: Option<JwkSet>,
    last_fetch: Option<Instant>,
}

impl JwksValidator {
    pub fn new(domain: &str, client: Client) -> Self {
        Self {
            jwks_url: format!("{}{}", base_url(domain), JWKS_PATH),
            client,
            min_refetch_interval: Duration::from_secs(JWKS_MIN_REFETCH_INTERVAL_SECS),
            keys: RwLock::new(KeySetCache::default()),
        }
    }

    pub fn with_min_refetch_interval(mut self, interval: Duration) -> Self {
        self.min_refetch_interval = interval;
        self
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    async fn fetch_key_set(&self) -> AuthResult<JwkSet> {
        info!(url = %self.jwks_url, "fetching jwks");
        let response = self.client.get(&self.jwks_url).send().await?;
        if !response.status().is_success() {
            return Err(AuthError::Jwks(format!(
                "jwks request to {} failed: {}",
                self.jwks_url,
                response.status()
            )));
        }
        let key_set = response.json::<JwkSet>().await?;
        self.keys.write().await.key_set = Some(key_set.clone());
        Ok(key_set)
    }

    /// Claim the next fetch slot; false while the last attempt is too recent.
    async fn try_start_fetch(&self) -> bool {
        let mut cache = self.keys.write().await;
        match cache.last_fetch {
            Some(last) if last.elapsed() < self.min_refetch_interval => false,
            _ => {
                cache.last_fetch = Some(Instant::now());
                true
            }
        }
    }

    async fn decoding_key(&self, kid: &str) -> AuthResult<(DecodingKey, Algorithm)> {
        let cached = self.keys.read().await.key_set.clone();
        let key_set = match cached {
            Some(key_set) if key_set.find(kid).is_some() => key_set,
            _ => {
                if self.try_start_fetch().await {
                    debug!(kid, "signing key not cached");
                    self.fetch_key_set().await?
                } else {
                    debug!(kid, "signing key not cached, jwks fetched recently");
                    return Err(AuthError::Jwks(format!("no signing key with kid '{}'", kid)));
                }
            }
        };
        let jwk = key_set
            .find(kid)
            .ok_or_else(|| AuthError::Jwks(format!("no signing key with kid '{}'", kid)))?;
        let algorithm = signing_algorithm(jwk)?;
        Ok((DecodingKey::from_jwk(jwk)?, algorithm))
    }
}

/// Algorithm declared by the key itself; RS256 when the key does not say.
fn signing_algorithm(jwk: &Jwk) -> AuthResult<Algorithm> {
    let algorithm = match &jwk.common.key_algorithm {
        None | Some(KeyAlgorithm::RS256) => Algorithm::RS256,
        Some(KeyAlgorithm::RS384) => Algorithm::RS384,
        Some(KeyAlgorithm::RS512) => Algorithm::RS512,
        Some(KeyAlgorithm::PS256) => Algorithm::PS256,
        Some(KeyAlgorithm::PS384) => Algorithm::PS384,
        Some(KeyAlgorithm::PS512) => Algorithm::PS512,
        Some(KeyAlgorithm::ES256) => Algorithm::ES256,
        Some(KeyAlgorithm::ES384) => Algorithm::ES384,
        Some(KeyAlgorithm::EdDSA) => Algorithm::EdDSA,
        Some(KeyAlgorithm::HS256) => Algorithm::HS256,
        Some(KeyAlgorithm::HS384) => Algorithm::HS384,
        Some(KeyAlgorithm::HS512) => Algorithm::HS512,
        Some(other) => {
            return Err(AuthError::Jwks(format!("key algorithm {:?} cannot verify signatures", other)));
        }
    };
    Ok(algorithm)
}

impl ClaimsValidator for JwksValidator {
    async fn validate(&self, token: &str, options: &ValidationOptions) -> AuthResult<DecodedClaims> {
        let header = decode_header(token)?;
        let kid = header
            .kid
            .ok_or_else(|| AuthError::Jwks("token header has no kid".to_owned()))?;
        let (key, algorithm) = self.decoding_key(&kid).await?;
        // a header alg other than the key's fails with InvalidAlgorithm
        let validation = validation_for(algorithm, options);
        Ok(decode::<DecodedClaims>(token, &key, &validation)?.claims)
    }
}

impl fmt::Debug for JwksValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwksValidator").field("jwks_url", &self.jwks_url).finish()
    }
}
