use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TryInsertResult,
};
use tracing::trace;

use super::{VisitorClass, VisitorTracker};
use crate::errors::{QrlinkerError, Result};

use migration::entities::visitor_record;

/// 数据库访客追踪器
///
/// 依赖 visitor_records 上的 (link_id, fingerprint) 唯一索引：
/// INSERT ... ON CONFLICT DO NOTHING 让并发首扫在存储层串行化，
/// 恰好一个请求观察到 `First`，其余观察到 `Returning`。
pub struct SeaOrmVisitorTracker {
    db: DatabaseConnection,
}

impl SeaOrmVisitorTracker {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VisitorTracker for SeaOrmVisitorTracker {
    async fn check_and_record(
        &self,
        link_id: &str,
        fingerprint: &str,
        now: DateTime<Utc>,
    ) -> Result<VisitorClass> {
        let record = visitor_record::ActiveModel {
            id: NotSet,
            link_id: Set(link_id.to_string()),
            fingerprint: Set(fingerprint.to_string()),
            first_seen_at: Set(now),
        };

        let result = visitor_record::Entity::insert(record)
            .on_conflict(
                OnConflict::columns([
                    visitor_record::Column::LinkId,
                    visitor_record::Column::Fingerprint,
                ])
                .do_nothing()
                .to_owned(),
            )
            .do_nothing()
            .exec(&self.db)
            .await
            .map_err(|e| {
                QrlinkerError::transient_storage(format!(
                    "访客记录写入失败 link={}: {}",
                    link_id, e
                ))
            })?;

        match result {
            TryInsertResult::Inserted(_) => {
                trace!("First visit recorded: link={} fp={}", link_id, fingerprint);
                Ok(VisitorClass::First)
            }
            TryInsertResult::Conflicted | TryInsertResult::Empty => Ok(VisitorClass::Returning),
        }
    }

    async fn purge_link(&self, link_id: &str) -> Result<u64> {
        let res = visitor_record::Entity::delete_many()
            .filter(visitor_record::Column::LinkId.eq(link_id))
            .exec(&self.db)
            .await
            .map_err(|e| {
                QrlinkerError::transient_storage(format!(
                    "访客记录清理失败 link={}: {}",
                    link_id, e
                ))
            })?;
        Ok(res.rows_affected)
    }

    fn backend_name(&self) -> &'static str {
        "sea-orm"
    }
}
