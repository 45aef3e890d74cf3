//! 链接配置缓存
//!
//! 扫码热路径上的 AdaptiveQrc 对象缓存，键为短码。
//! 负缓存（NotFound）避免无效短码反复打到数据库。

mod moka;
mod null;

pub use self::moka::MokaObjectCache;
pub use self::null::NullObjectCache;

use std::sync::Arc;

use async_trait::async_trait;

use crate::adaptive::AdaptiveQrc;
use crate::config::get_config;

/// 缓存查询结果
#[derive(Debug, Clone)]
pub enum CacheResult {
    /// 命中
    Found(Arc<AdaptiveQrc>),
    /// 未缓存，需要回源
    Miss,
    /// 负缓存命中：确定不存在
    NotFound,
}

#[async_trait]
pub trait ObjectCache: Send + Sync {
    async fn get(&self, code: &str) -> CacheResult;
    async fn insert(&self, code: &str, link: Arc<AdaptiveQrc>);
    /// 记录负缓存（短码确定不存在）
    async fn mark_not_found(&self, code: &str);
    async fn remove(&self, code: &str);
    async fn invalidate_all(&self);
    fn backend_name(&self) -> &'static str;
}

pub struct CacheFactory;

impl CacheFactory {
    pub fn create() -> Arc<dyn ObjectCache> {
        let config = get_config();
        match config.cache.cache_type.as_str() {
            "null" => Arc::new(NullObjectCache),
            _ => Arc::new(MokaObjectCache::new(
                config.cache.max_capacity,
                config.cache.default_ttl,
            )),
        }
    }
}
