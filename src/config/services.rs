use std::collections::HashMap;
use std::env;

use serde::Deserialize;

use crate::auth::actor::ActorClaims;
use crate::auth::service::TokenServiceConfig;
use crate::config::settings::SettingsConfig;
use crate::errors::{AuthError, AuthResult};
use crate::helpers::time::get_expiration_offset_ms;

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    pub services: HashMap<String, DownstreamConfig>,
}

/// ================================
/// Downstream services
/// ================================
/// Credentials and audience for one downstream service.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DownstreamConfig {
    /// Auth0 tenant domain, with or without scheme.
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub audience: String,
    #[serde(default)]
    pub issuer: String,
    /// Cache key; the service name when absent.
    pub token_key: Option<String>,
    #[serde(default)]
    pub claims: ActorClaims,
}

/// Environment variable names a downstream service is resolved from.
#[derive(Debug, Clone)]
pub struct EnvKeys {
    pub domain_key: String,
    pub client_id_key: String,
    pub client_secret_key: String,
    pub audience_key: String,
    pub issuer_key: String,
    /// Literal cache key, not an environment variable name.
    pub token_key: String,
}

impl DownstreamConfig {
    /// Resolve every key from the process environment. Missing or empty
    /// variables are reported together.
    pub fn from_env(keys: &EnvKeys) -> AuthResult<Self> {
        let mut missing = Vec::new();
        let mut read = |key: &str| match env::var(key) {
            Ok(value) if !value.trim().is_empty() => value,
            _ => {
                missing.push(key.to_owned());
                String::new()
            }
        };

        let config = Self {
            domain: read(&keys.domain_key),
            client_id: read(&keys.client_id_key),
            client_secret: read(&keys.client_secret_key),
            audience: read(&keys.audience_key),
            issuer: read(&keys.issuer_key),
            token_key: Some(keys.token_key.to_owned()),
            claims: ActorClaims::default(),
        };

        if !missing.is_empty() {
            return Err(AuthError::Config(format!(
                "token '{}': missing environment variables {}",
                keys.token_key,
                missing.join(", ")
            )));
        }
        Ok(config)
    }

    pub fn token_key<'a>(&'a self, service_name: &'a str) -> &'a str {
        self.token_key.as_deref().unwrap_or(service_name)
    }

    pub fn token_service_config(&self, service_name: &str, settings: &SettingsConfig) -> TokenServiceConfig {
        TokenServiceConfig {
            token_key: self.token_key(service_name).to_owned(),
            audience: self.audience.to_owned(),
            issuer: self.issuer.to_owned(),
            actor_claims: self.claims.to_owned(),
            expiration_offset_ms: get_expiration_offset_ms(settings.expiration_offset_ms),
        }
    }
}
