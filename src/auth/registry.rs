use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::info;

use crate::auth::service::TokenService;
use crate::auth::validator::JwksValidator;
use crate::cache::token_cache::TokenCache;
use crate::config::services::ServiceConfig;
use crate::errors::{AuthError, AuthResult};
use crate::sources::auth0::Auth0Client;

pub type Auth0TokenService = TokenService<Auth0Client, JwksValidator>;

/// One token service per configured downstream, all sharing a single cache
/// and HTTP client.
#[derive(Debug, Clone)]
pub struct TokenServices {
    cache: TokenCache,
    services: HashMap<String, Arc<Auth0TokenService>>,
}

impl TokenServices {
    pub fn from_config(config: &ServiceConfig, cache: TokenCache) -> AuthResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.settings.http_timeout_ms()))
            .build()?;

        let mut services = HashMap::with_capacity(config.services.len());
        for (name, downstream) in &config.services {
            let provider = Auth0Client::new(
                &downstream.domain,
                downstream.client_id.to_owned(),
                downstream.client_secret.to_owned(),
                client.clone(),
            );
            let validator = JwksValidator::new(&downstream.domain, client.clone());
            let service_config = downstream.token_service_config(name, &config.settings);
            info!(service = %name, token_key = %service_config.token_key, audience = %service_config.audience, "token service configured");

            let service = TokenService::new(service_config, cache.clone(), provider, validator);
            services.insert(name.to_owned(), Arc::new(service));
        }

        Ok(Self { cache, services })
    }

    pub fn get(&self, name: &str) -> AuthResult<Arc<Auth0TokenService>> {
        self.services
            .get(name)
            .cloned()
            .ok_or_else(|| AuthError::Config(format!("unknown service '{}'", name)))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.services.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }
}
