use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::cache::stored_token::StoredToken;

/// Process-wide token store: token_key -> latest token.
///
/// Construct once at startup and hand clones to every consumer; clones share
/// the same map. Expiry is not enforced here.
#[derive(Debug, Clone, Default)]
pub struct TokenCache {
    inner: Arc<RwLock<HashMap<String, Arc<StoredToken>>>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self { inner: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Token stored under `key`, expired or not.
    pub async fn get_token(&self, key: &str) -> Option<Arc<StoredToken>> {
        self.inner.read().await.get(key).cloned()
    }

    /// Replace whatever is stored under `key`.
    pub async fn save_token(&self, key: &str, token: Arc<StoredToken>) {
        let mut map = self.inner.write().await;
        map.insert(key.to_owned(), token);
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Stored keys in ascending order.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.read().await.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }
}
