use std::fmt;

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::{AuthError, AuthResult};
use crate::sources::{TokenProvider, TokenResponse};
use crate::utils::constants::{GRANT_CLIENT_CREDENTIALS, GRANT_REFRESH_TOKEN, OAUTH_TOKEN_PATH};

/// Auth0 token endpoint client.
#[derive(Clone)]
pub struct Auth0Client {
    base_url: String,
    client_id: String,
    client_secret: String,
    client: Client,
}

#[derive(Serialize)]
struct GrantRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    audience: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
}

impl Auth0Client {
    pub fn new(domain: &str, client_id: impl Into<String>, client_secret: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url(domain),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            client,
        }
    }

    pub fn token_url(&self) -> String {
        format!("{}{}", self.base_url, OAUTH_TOKEN_PATH)
    }

    async fn grant(&self, request: GrantRequest<'_>) -> AuthResult<TokenResponse> {
        let grant = request.grant_type;
        let url = self.token_url();
        debug!(grant, url = %url, "requesting token");

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(grant, %status, "token grant rejected");
            return Err(AuthError::GrantRejected { grant, status, body });
        }
        Ok(response.json::<TokenResponse>().await?)
    }
}

impl TokenProvider for Auth0Client {
    async fn client_credentials_grant(&self, audience: &str) -> AuthResult<TokenResponse> {
        self.grant(GrantRequest {
            grant_type: GRANT_CLIENT_CREDENTIALS,
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            audience: Some(audience),
            refresh_token: None,
        })
        .await
    }

    async fn refresh_token(&self, refresh_token: &str) -> AuthResult<TokenResponse> {
        self.grant(GrantRequest {
            grant_type: GRANT_REFRESH_TOKEN,
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            audience: None,
            refresh_token: Some(refresh_token),
        })
        .await
    }
}

impl fmt::Debug for Auth0Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth0Client")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Tenant domain to base URL; bare domains get `https://`.
pub fn base_url(domain: &str) -> String {
    let domain = domain.trim().trim_end_matches('/');
    if domain.starts_with("http://") || domain.starts_with("https://") {
        domain.to_owned()
    } else {
        format!("https://{}", domain)
    }
}
