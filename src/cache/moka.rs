use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::debug;

use super::{CacheResult, ObjectCache};
use crate::adaptive::AdaptiveQrc;

/// moka 对象缓存
///
/// 值为 `None` 表示负缓存条目（短码不存在）。
pub struct MokaObjectCache {
    inner: Cache<String, Option<Arc<AdaptiveQrc>>>,
}

impl MokaObjectCache {
    pub fn new(max_capacity: u64, ttl_secs: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        debug!(
            "MokaObjectCache initialized with max capacity: {}, TTL: {}s",
            max_capacity, ttl_secs
        );
        Self { inner }
    }
}

#[async_trait]
impl ObjectCache for MokaObjectCache {
    async fn get(&self, code: &str) -> CacheResult {
        match self.inner.get(code).await {
            Some(Some(link)) => CacheResult::Found(link),
            Some(None) => CacheResult::NotFound,
            None => CacheResult::Miss,
        }
    }

    async fn insert(&self, code: &str, link: Arc<AdaptiveQrc>) {
        self.inner.insert(code.to_string(), Some(link)).await;
    }

    async fn mark_not_found(&self, code: &str) {
        self.inner.insert(code.to_string(), None).await;
    }

    async fn remove(&self, code: &str) {
        self.inner.invalidate(code).await;
    }

    async fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
