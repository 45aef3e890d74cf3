use std::sync::Arc;

use async_trait::async_trait;

use super::{CacheResult, ObjectCache};
use crate::adaptive::AdaptiveQrc;

/// 空缓存：永远 Miss，所有查询直达存储
pub struct NullObjectCache;

#[async_trait]
impl ObjectCache for NullObjectCache {
    async fn get(&self, _code: &str) -> CacheResult {
        CacheResult::Miss
    }

    async fn insert(&self, _code: &str, _link: Arc<AdaptiveQrc>) {}

    async fn mark_not_found(&self, _code: &str) {}

    async fn remove(&self, _code: &str) {}

    async fn invalidate_all(&self) {}

    fn backend_name(&self) -> &'static str {
        "null"
    }
}
