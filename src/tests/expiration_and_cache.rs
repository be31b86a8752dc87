#[cfg(test)]
mod test {

    use std::sync::Arc;

    use chrono::{DateTime, Duration, Utc};

    use crate::cache::{stored_token::StoredToken, token_cache::TokenCache};
    use crate::sources::TokenResponse;

    #[test]
    fn token_expires_offset_before_provider_expiry() {
        let minted_at = Utc::now();
        let token = StoredToken::new_at(minted_at, "abc", "Bearer", 120_000, None);

        assert_eq!(token.expires_at(), minted_at + Duration::seconds(60));
        assert!(!token.expired_at(minted_at));
        assert!(!token.expired_at(minted_at + Duration::seconds(59)));
        assert!(token.expired_at(minted_at + Duration::seconds(60)));
        assert!(token.expired_at(minted_at + Duration::seconds(61)));
    }

    #[test]
    fn fresh_token_is_not_expired_on_wall_clock() {
        let token = StoredToken::new("abc", "Bearer", 120_000, None);
        assert!(!token.expired());
    }

    #[test]
    fn token_shorter_than_offset_is_born_expired() {
        let token = StoredToken::new("short", "Bearer", 30_000, None);
        assert!(token.expired());

        let exactly_offset = StoredToken::new("edge", "Bearer", 60_000, None);
        assert!(exactly_offset.expired());
    }

    #[test]
    fn custom_offset_shifts_expiry() {
        let minted_at = Utc::now();
        let token = StoredToken::with_offset(minted_at, "abc", "Bearer", 10_000, None, 0);
        assert!(!token.expired_at(minted_at + Duration::seconds(9)));
        assert!(token.expired_at(minted_at + Duration::seconds(10)));
    }

    #[test]
    fn zero_lifetime_response_is_born_expired() {
        let minted_at = Utc::now();
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token":"abc","expires_in":0}"#).unwrap();
        let token = StoredToken::from_response_at(minted_at, &response, 60_000);

        assert_eq!(token.expires_at(), minted_at - Duration::seconds(60));
        assert!(token.expired_at(minted_at));
        assert!(token.expired());
    }

    #[test]
    fn huge_lifetime_response_saturates_instead_of_panicking() {
        let minted_at = Utc::now();
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token":"abc","expires_in":10000000000000}"#).unwrap();
        let token = StoredToken::from_response_at(minted_at, &response, 60_000);

        assert_eq!(token.expires_at(), DateTime::<Utc>::MAX_UTC);
        assert!(!token.expired());
    }

    #[test]
    fn max_lifetime_and_offset_do_not_overflow() {
        let minted_at = Utc::now();
        let forever = StoredToken::with_offset(minted_at, "abc", "Bearer", u64::MAX, None, 60_000);
        assert!(!forever.expired_at(minted_at));

        let never = StoredToken::with_offset(minted_at, "abc", "Bearer", 0, None, u64::MAX);
        assert_eq!(never.expires_at(), DateTime::<Utc>::MIN_UTC);
        assert!(never.expired_at(minted_at));
    }

    #[test]
    fn authorization_value_joins_type_and_token() {
        let token = StoredToken::new("abc", "Bearer", 120_000, None);
        assert_eq!(token.authorization_value(), "Bearer abc");
    }

    #[test]
    fn response_seconds_become_milliseconds() {
        let minted_at = Utc::now();
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token":"abc","token_type":"Bearer","expires_in":86400,"refresh_token":"r1"}"#,
        )
        .unwrap();
        let token = StoredToken::from_response_at(minted_at, &response, 60_000);

        assert_eq!(token.access_token(), "abc");
        assert_eq!(token.token_type(), "Bearer");
        assert_eq!(token.refresh_token(), Some("r1"));
        assert_eq!(token.expires_at(), minted_at + Duration::seconds(86400 - 60));
    }

    #[test]
    fn response_without_token_type_defaults_to_bearer() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token":"abc","expires_in":3600}"#).unwrap();
        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.refresh_token, None);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let token = StoredToken::new("super-secret", "Bearer", 120_000, Some("refresh-secret".into()));
        let printed = format!("{:?}", token);
        assert!(!printed.contains("super-secret"));
        assert!(!printed.contains("refresh-secret"));
    }

    #[tokio::test]
    async fn cache_returns_the_saved_instance() {
        let cache = TokenCache::new();
        let token = Arc::new(StoredToken::new("abc", "Bearer", 120_000, None));

        cache.save_token("patients", token.clone()).await;
        let got = cache.get_token("patients").await.expect("cached token");

        assert!(Arc::ptr_eq(&got, &token));
    }

    #[tokio::test]
    async fn cache_miss_returns_none() {
        let cache = TokenCache::new();
        assert!(cache.get_token("unknown").await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn cache_keeps_expired_tokens() {
        let cache = TokenCache::new();
        let expired = Arc::new(StoredToken::new("old", "Bearer", 1_000, None));
        cache.save_token("patients", expired).await;

        let got = cache.get_token("patients").await.expect("expired token still stored");
        assert!(got.expired());
    }

    #[tokio::test]
    async fn save_overwrites_previous_token() {
        let cache = TokenCache::new();
        cache.save_token("patients", Arc::new(StoredToken::new("first", "Bearer", 120_000, None))).await;
        cache.save_token("patients", Arc::new(StoredToken::new("second", "Bearer", 120_000, None))).await;

        let got = cache.get_token("patients").await.unwrap();
        assert_eq!(got.access_token(), "second");
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn clones_share_one_map() {
        let cache = TokenCache::new();
        let other = cache.clone();
        other.save_token("insurance", Arc::new(StoredToken::new("abc", "Bearer", 120_000, None))).await;

        assert!(cache.get_token("insurance").await.is_some());
        assert_eq!(cache.keys().await, vec!["insurance".to_string()]);
    }
}
