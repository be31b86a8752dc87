use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::auth::actor::{ActorClaims, PolicyActor};
use crate::auth::validator::{ClaimsValidator, DecodedClaims, ValidationOptions};
use crate::cache::stored_token::StoredToken;
use crate::cache::token_cache::TokenCache;
use crate::errors::AuthResult;
use crate::helpers::time::{Clock, SystemClock};
use crate::observability::metrics::get_metrics;
use crate::sources::{TokenProvider, TokenResponse};
use crate::utils::constants::{EXPIRATION_OFFSET_MS, GRANT_CLIENT_CREDENTIALS, GRANT_REFRESH_TOKEN};

static REUSE_MSG: &str = "reuse";

/// Per-audience settings of a [`TokenService`].
#[derive(Debug, Clone)]
pub struct TokenServiceConfig {
    /// Cache key, one per downstream audience.
    pub token_key: String,
    pub audience: String,
    pub issuer: String,
    pub actor_claims: ActorClaims,
    pub expiration_offset_ms: u64,
}

impl TokenServiceConfig {
    pub fn new(token_key: impl Into<String>, audience: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            token_key: token_key.into(),
            audience: audience.into(),
            issuer: issuer.into(),
            actor_claims: ActorClaims::default(),
            expiration_offset_ms: EXPIRATION_OFFSET_MS,
        }
    }
}

/// Decides whether to reuse, refresh or mint the token for one audience.
///
/// Each `get_token` call resolves independently: concurrent callers that all
/// see a missing or expired token each issue their own grant, and the last
/// write to the cache wins.
#[derive(Debug)]
pub struct TokenService<P, V> {
    config: TokenServiceConfig,
    validation: ValidationOptions,
    cache: TokenCache,
    provider: P,
    validator: V,
    clock: Arc<dyn Clock>,
}

impl<P, V> TokenService<P, V>
where
    P: TokenProvider,
    V: ClaimsValidator,
{
    pub fn new(config: TokenServiceConfig, cache: TokenCache, provider: P, validator: V) -> Self {
        let validation = ValidationOptions {
            audience: config.audience.to_owned(),
            issuer: config.issuer.to_owned(),
        };
        Self {
            config,
            validation,
            cache,
            provider,
            validator,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &TokenServiceConfig {
        &self.config
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Cached token when still valid, otherwise a refreshed or newly minted one.
    pub async fn get_token(&self) -> AuthResult<Arc<StoredToken>> {
        let token_key = self.config.token_key.as_str();

        match self.cache.get_token(token_key).await {
            Some(token) if !token.expired_at(self.clock.now()) => {
                debug!(token_key, "reusing cached token");
                get_metrics().await.token_requests.with_label_values(&[token_key, REUSE_MSG]).inc();
                Ok(token)
            }
            Some(token) => match token.refresh_token() {
                Some(refresh_token) => {
                    info!(token_key, "cached token expired, refreshing");
                    self.refresh(refresh_token).await
                }
                None => {
                    info!(token_key, "cached token expired, minting");
                    self.mint().await
                }
            },
            None => {
                info!(token_key, "no cached token, minting");
                self.mint().await
            }
        }
    }

    async fn mint(&self) -> AuthResult<Arc<StoredToken>> {
        let start = Instant::now();
        let response = self.provider.client_credentials_grant(&self.config.audience).await;
        self.store(GRANT_CLIENT_CREDENTIALS, start, response).await
    }

    async fn refresh(&self, refresh_token: &str) -> AuthResult<Arc<StoredToken>> {
        let start = Instant::now();
        let response = self.provider.refresh_token(refresh_token).await;
        self.store(GRANT_REFRESH_TOKEN, start, response).await
    }

    async fn store(
        &self,
        grant: &str,
        start: Instant,
        response: AuthResult<TokenResponse>,
    ) -> AuthResult<Arc<StoredToken>> {
        let token_key = self.config.token_key.as_str();
        let metrics = get_metrics().await;
        metrics
            .grant_duration
            .with_label_values(&[token_key, grant])
            .observe(start.elapsed().as_secs_f64());

        let response = response.inspect_err(|err| {
            warn!(token_key, grant, error = %err, "token grant failed");
            metrics.grant_failures.with_label_values(&[token_key, grant]).inc();
        })?;

        let token = Arc::new(StoredToken::from_response_at(
            self.clock.now(),
            &response,
            self.config.expiration_offset_ms,
        ));
        if token.expired_at(self.clock.now()) {
            warn!(
                token_key,
                expires_in = response.expires_in,
                offset_ms = self.config.expiration_offset_ms,
                "token lifetime shorter than expiration offset, next call will mint again"
            );
        }

        self.cache.save_token(token_key, token.clone()).await;

        metrics.token_requests.with_label_values(&[token_key, grant]).inc();
        metrics.cached_tokens.set(self.cache.len().await as i64);
        metrics
            .token_expiry_unix
            .with_label_values(&[token_key])
            .set(token.expires_at().timestamp());
        info!(token_key, grant, expires_at = %token.expires_at(), "token stored");

        Ok(token)
    }

    /// Validate `token` against the configured audience and issuer.
    pub async fn validate_token(&self, token: &str) -> AuthResult<DecodedClaims> {
        self.validator.validate(token, &self.validation).await
    }

    /// Identity carried by this service's own token.
    pub async fn get_policy_actor(&self) -> AuthResult<PolicyActor> {
        let token = self.get_token().await?;
        let claims = self.validate_token(token.access_token()).await?;
        PolicyActor::from_claims(&claims, &self.config.actor_claims)
    }
}
