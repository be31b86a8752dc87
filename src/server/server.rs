use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use http::StatusCode;
use serde::Serialize;
use tracing::{info, warn};

use crate::auth::registry::TokenServices;
use crate::config::settings::SettingsConfig;
use crate::errors::AuthError;
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
    pub services: Arc<TokenServices>,
}

impl AppState {
    pub fn new(metrics: &Metrics, services: Arc<TokenServices>) -> Self {
        Self {
            metrics_state: MetricsState::new(metrics.registry.clone()),
            services,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenBody {
    pub authorization: String,
    pub expires_at: String,
}

/// Token keys currently held in the shared cache, expired ones included.
#[derive(Debug, Serialize)]
pub struct CachedTokensBody {
    pub token_keys: Vec<String>,
}

pub fn router(settings_config: &SettingsConfig, state: AppState) -> Router {
    Router::new()
        .merge(state.metrics_state.router(&settings_config.metrics))
        .route("/health", get(health))
        .route("/tokens", get(cached_tokens))
        .route("/tokens/{service}", get(get_token))
        .with_state(state)
}

/// Serve token and metrics routes until the process stops.
pub async fn start(settings_config: &SettingsConfig, services: Arc<TokenServices>) -> Result<()> {
    let metrics = get_metrics().await;
    let app = router(settings_config, AppState::new(metrics, services));

    let bind_addr = format!("{}:{}", settings_config.server.host, settings_config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {}", bind_addr))?;
    info!("listening on {}", bind_addr);
    metrics.up.set(1);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    metrics.up.set(0);
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn cached_tokens(State(state): State<AppState>) -> Json<CachedTokensBody> {
    Json(CachedTokensBody { token_keys: state.services.cache().keys().await })
}

async fn get_token(State(state): State<AppState>, Path(service): Path<String>) -> Response {
    let token_service = match state.services.get(&service) {
        Ok(token_service) => token_service,
        Err(err) => return (StatusCode::NOT_FOUND, err.to_string()).into_response(),
    };

    match token_service.get_token().await {
        Ok(token) => Json(TokenBody {
            authorization: token.authorization_value(),
            expires_at: token.expires_at().to_rfc3339(),
        })
        .into_response(),
        Err(err) => {
            warn!(service = %service, error = %err, "token unavailable");
            (status_for(&err), err.to_string()).into_response()
        }
    }
}

/// Map token failures onto the status a caller of this service sees.
pub fn status_for(err: &AuthError) -> StatusCode {
    match err {
        AuthError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        AuthError::GrantRejected { status, .. } if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN => {
            StatusCode::UNAUTHORIZED
        }
        AuthError::Claims(_) | AuthError::Actor(_) => StatusCode::UNAUTHORIZED,
        AuthError::GrantRejected { .. } | AuthError::Http(_) | AuthError::Jwks(_) => StatusCode::BAD_GATEWAY,
    }
}
