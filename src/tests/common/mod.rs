// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use http::StatusCode;
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::Client;
use serde_json::Value;

use crate::auth::service::{TokenService, TokenServiceConfig};
use crate::auth::validator::SharedSecretValidator;
use crate::cache::token_cache::TokenCache;
use crate::errors::{AuthError, AuthResult};
use crate::sources::{TokenProvider, TokenResponse};

pub const SECRET: &[u8] = b"test-signing-secret";
pub const AUDIENCE: &str = "https://patients.example.com";
pub const ISSUER: &str = "https://tenant.example.com/";

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

/// HS256 token signed with [`SECRET`], valid for an hour, with extra claims merged in.
pub fn signed_jwt(audience: &str, extra: Value) -> String {
    let mut claims = json!({
        "iss": ISSUER,
        "sub": "client@clients",
        "aud": audience,
        "iat": Utc::now().timestamp(),
        "exp": Utc::now().timestamp() + 3600,
    });
    if let (Some(claims), Some(extra)) = (claims.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            claims.insert(k.to_owned(), v.to_owned());
        }
    }
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET)).expect("jwt encode")
}

/// In-memory token provider recording every grant it serves.
/// Clones share counters.
#[derive(Debug, Clone)]
pub struct MockProvider {
    pub client_credentials_calls: Arc<AtomicUsize>,
    pub refresh_calls: Arc<AtomicUsize>,
    pub audiences: Arc<Mutex<Vec<String>>>,
    pub refresh_tokens: Arc<Mutex<Vec<String>>>,
    access_token: Option<String>,
    expires_in: u64,
    refresh_token: Option<String>,
    delay: Option<Duration>,
    fail: bool,
}

impl MockProvider {
    pub fn new(expires_in: u64) -> Self {
        Self {
            client_credentials_calls: Arc::new(AtomicUsize::new(0)),
            refresh_calls: Arc::new(AtomicUsize::new(0)),
            audiences: Arc::new(Mutex::new(Vec::new())),
            refresh_tokens: Arc::new(Mutex::new(Vec::new())),
            access_token: None,
            expires_in,
            refresh_token: None,
            delay: None,
            fail: false,
        }
    }

    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn client_credentials_calls(&self) -> usize {
        self.client_credentials_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    async fn respond(&self, grant: &'static str, n: usize) -> AuthResult<TokenResponse> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(AuthError::GrantRejected {
                grant,
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: "provider down".to_owned(),
            });
        }
        Ok(TokenResponse {
            access_token: self
                .access_token
                .to_owned()
                .unwrap_or_else(|| format!("{}-{}", grant, n)),
            token_type: "Bearer".to_owned(),
            expires_in: self.expires_in,
            refresh_token: self.refresh_token.to_owned(),
        })
    }
}

impl TokenProvider for MockProvider {
    async fn client_credentials_grant(&self, audience: &str) -> AuthResult<TokenResponse> {
        let n = self.client_credentials_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.audiences.lock().unwrap().push(audience.to_owned());
        self.respond("client_credentials", n).await
    }

    async fn refresh_token(&self, refresh_token: &str) -> AuthResult<TokenResponse> {
        let n = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.refresh_tokens.lock().unwrap().push(refresh_token.to_owned());
        self.respond("refresh_token", n).await
    }
}

pub fn service_config(token_key: &str) -> TokenServiceConfig {
    TokenServiceConfig::new(token_key, AUDIENCE, ISSUER)
}

pub fn token_service(
    token_key: &str,
    cache: TokenCache,
    provider: MockProvider,
) -> TokenService<MockProvider, SharedSecretValidator> {
    TokenService::new(service_config(token_key), cache, provider, SharedSecretValidator::new(SECRET))
}
