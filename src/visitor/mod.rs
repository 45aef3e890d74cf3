//! 访客状态追踪
//!
//! 回答"这个指纹是否扫过这个链接"，并持久化首次扫码时间。
//! check-and-record 必须是单次原子操作：并发首扫只能有一个请求
//! 被判定为首次访问，其余都是回访。
//!
//! 指纹碰撞（不同访客产生相同指纹）是已接受的近似，
//! 追踪器不在指纹本身的区分度之外做去重。

mod memory;
mod sea_orm;

pub use self::memory::MemoryVisitorTracker;
pub use self::sea_orm::SeaOrmVisitorTracker;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::Result;

/// 访客分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitorClass {
    /// 该 (link, fingerprint) 首次出现，已记录
    First,
    /// 此前已记录过
    Returning,
}

impl VisitorClass {
    pub fn is_first_visit(&self) -> bool {
        matches!(self, VisitorClass::First)
    }
}

#[async_trait]
pub trait VisitorTracker: Send + Sync {
    /// 原子地查询并记录访客指纹
    ///
    /// 首次出现时写入 first_seen_at = now 并返回 `First`；
    /// 已存在时不做任何写入，返回 `Returning`。
    /// 存储不可达/超时返回 `TransientStorage`，绝不静默猜测分类。
    async fn check_and_record(
        &self,
        link_id: &str,
        fingerprint: &str,
        now: DateTime<Utc>,
    ) -> Result<VisitorClass>;

    /// 删除一个链接的全部访客记录（链接删除时级联调用）
    async fn purge_link(&self, link_id: &str) -> Result<u64>;

    fn backend_name(&self) -> &'static str;
}
