#[cfg(test)]
mod test {

    use std::sync::Arc;

    use httpmock::prelude::*;
    use serde_json::{json, Value};

    use crate::auth::registry::TokenServices;
    use crate::cache::token_cache::TokenCache;
    use crate::config::loader::parse_config;
    use crate::errors::AuthError;
    use crate::observability::metrics::get_metrics;
    use crate::server::server::{router, status_for, AppState};
    use crate::tests::common::{build_reqwest_client, spawn_axum};

    async fn config_for(domain: &str) -> crate::ServiceConfig {
        let content = format!(
            r#"
settings:
  metrics: {{ is_enabled: true }}
services:
  patients:
    domain: {domain}
    client_id: bff-client
    client_secret: s3cret
    audience: https://patients.example.com
    issuer: https://tenant.us.auth0.com/
"#
        );
        parse_config(&content).await.unwrap()
    }

    #[tokio::test]
    async fn serves_tokens_health_and_metrics() {
        let auth0 = MockServer::start_async().await;
        let grant = auth0
            .mock_async(|when, then| {
                when.method(POST).path("/oauth/token");
                then.status(200).json_body(json!({
                    "access_token": "abc",
                    "token_type": "Bearer",
                    "expires_in": 86400
                }));
            })
            .await;

        let config = config_for(&auth0.base_url()).await;
        let services = Arc::new(TokenServices::from_config(&config, TokenCache::new()).unwrap());
        assert_eq!(services.names(), vec!["patients"]);

        let state = AppState::new(get_metrics().await, services.clone());
        let (handle, addr) = spawn_axum(router(&config.settings, state)).await;
        let client = build_reqwest_client();

        for _ in 0..2 {
            let body: Value = client
                .get(format!("http://{}/tokens/patients", addr))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            assert_eq!(body["authorization"], "Bearer abc");
            assert!(body["expires_at"].is_string());
        }
        grant.assert_hits_async(1).await;
        assert!(services.cache().get_token("patients").await.is_some());

        let cached: Value = client
            .get(format!("http://{}/tokens", addr))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(cached, json!({ "token_keys": ["patients"] }));

        let missing = client.get(format!("http://{}/tokens/billing", addr)).send().await.unwrap();
        assert_eq!(missing.status().as_u16(), 404);

        let health = client.get(format!("http://{}/health", addr)).send().await.unwrap();
        assert_eq!(health.text().await.unwrap(), "ok");

        let metrics = client.get(format!("http://{}/metrics", addr)).send().await.unwrap().text().await.unwrap();
        assert!(metrics.contains("stationauth_token_requests_total"));

        handle.abort();
    }

    #[tokio::test]
    async fn rejected_grant_maps_to_unauthorized() {
        let auth0 = MockServer::start_async().await;
        auth0
            .mock_async(|when, then| {
                when.method(POST).path("/oauth/token");
                then.status(403).body("forbidden");
            })
            .await;

        let config = config_for(&auth0.base_url()).await;
        let services = Arc::new(TokenServices::from_config(&config, TokenCache::new()).unwrap());
        let (handle, addr) = spawn_axum(router(&config.settings, AppState::new(get_metrics().await, services))).await;

        let response = build_reqwest_client()
            .get(format!("http://{}/tokens/patients", addr))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 401);
        handle.abort();
    }

    #[test]
    fn failures_map_to_gateway_statuses() {
        assert_eq!(status_for(&AuthError::Config("x".into())).as_u16(), 500);
        assert_eq!(status_for(&AuthError::Jwks("x".into())).as_u16(), 502);
        assert_eq!(
            status_for(&AuthError::GrantRejected {
                grant: "client_credentials",
                status: http::StatusCode::INTERNAL_SERVER_ERROR,
                body: String::new(),
            })
            .as_u16(),
            502
        );
    }

    #[tokio::test]
    async fn cached_token_keys_start_empty() {
        let config = config_for("http://127.0.0.1:1").await;
        let services = Arc::new(TokenServices::from_config(&config, TokenCache::new()).unwrap());
        let (handle, addr) = spawn_axum(router(&config.settings, AppState::new(get_metrics().await, services))).await;

        let cached: Value = build_reqwest_client()
            .get(format!("http://{}/tokens", addr))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(cached, json!({ "token_keys": [] }));
        handle.abort();
    }
}
