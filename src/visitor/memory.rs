use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::trace;

use super::{VisitorClass, VisitorTracker};
use crate::errors::Result;

/// 进程内访客追踪器
///
/// DashMap entry API 保证同一 key 的并发 check-and-record 串行化。
/// 进程重启即丢失，适合测试和单机部署。
#[derive(Default)]
pub struct MemoryVisitorTracker {
    seen: DashMap<(String, String), DateTime<Utc>>,
}

impl MemoryVisitorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前记录数（测试用）
    pub fn record_count(&self) -> usize {
        self.seen.len()
    }
}

#[async_trait]
impl VisitorTracker for MemoryVisitorTracker {
    async fn check_and_record(
        &self,
        link_id: &str,
        fingerprint: &str,
        now: DateTime<Utc>,
    ) -> Result<VisitorClass> {
        let key = (link_id.to_string(), fingerprint.to_string());
        match self.seen.entry(key) {
            Entry::Occupied(_) => Ok(VisitorClass::Returning),
            Entry::Vacant(vacant) => {
                vacant.insert(now);
                trace!("First visit recorded: link={} fp={}", link_id, fingerprint);
                Ok(VisitorClass::First)
            }
        }
    }

    async fn purge_link(&self, link_id: &str) -> Result<u64> {
        let before = self.seen.len();
        self.seen.retain(|(link, _), _| link != link_id);
        Ok((before - self.seen.len()) as u64)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
