use std::sync::Arc;

use http::header::AUTHORIZATION;
use reqwest::{Client, Method, RequestBuilder};
use tracing::debug;

use crate::auth::service::TokenService;
use crate::auth::validator::ClaimsValidator;
use crate::errors::AuthResult;
use crate::sources::TokenProvider;

/// HTTP client for one downstream service; every request carries the
/// service's current machine-to-machine token.
#[derive(Debug)]
pub struct AuthorizedClient<P, V> {
    client: Client,
    tokens: Arc<TokenService<P, V>>,
}

impl<P, V> Clone for AuthorizedClient<P, V> {
    fn clone(&self) -> Self {
        Self { client: self.client.clone(), tokens: self.tokens.clone() }
    }
}

impl<P, V> AuthorizedClient<P, V>
where
    P: TokenProvider,
    V: ClaimsValidator,
{
    pub fn new(client: Client, tokens: Arc<TokenService<P, V>>) -> Self {
        Self { client, tokens }
    }

    /// Request builder with `Authorization` set. Token failures surface here,
    /// before anything is sent.
    pub async fn request(&self, method: Method, url: &str) -> AuthResult<RequestBuilder> {
        let token = self.tokens.get_token().await?;
        debug!(token_key = %self.tokens.config().token_key, %method, url, "authorizing request");
        Ok(self
            .client
            .request(method, url)
            .header(AUTHORIZATION, token.authorization_value()))
    }

    pub async fn get(&self, url: &str) -> AuthResult<RequestBuilder> {
        self.request(Method::GET, url).await
    }

    pub async fn post(&self, url: &str) -> AuthResult<RequestBuilder> {
        self.request(Method::POST, url).await
    }
}
