use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, EntityTrait, ExprTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use super::SeaOrmStorage;
use super::converters::{model_to_qrc, qrc_to_active_model};
use crate::adaptive::AdaptiveQrc;
use crate::analytics::ScanDetail;
use crate::errors::Result;

use migration::entities::{adaptive_qrc, scan_log};

/// 分页查询结果
#[derive(Debug, Clone)]
pub struct QrcPage {
    pub items: Vec<AdaptiveQrc>,
    pub total: u64,
}

impl SeaOrmStorage {
    /// 按短码查找链接
    pub async fn get_by_code(&self, code: &str) -> Result<Option<AdaptiveQrc>> {
        let model = adaptive_qrc::Entity::find()
            .filter(adaptive_qrc::Column::Code.eq(code))
            .one(self.get_db())
            .await?;

        model.map(model_to_qrc).transpose()
    }

    /// 插入新链接（短码冲突返回数据库错误，由服务层预检）
    pub async fn insert_qrc(&self, link: &AdaptiveQrc) -> Result<()> {
        let active = qrc_to_active_model(link)?;
        adaptive_qrc::Entity::insert(active).exec(self.get_db()).await?;
        Ok(())
    }

    /// 按主键更新链接
    pub async fn update_qrc(&self, link: &AdaptiveQrc) -> Result<()> {
        let active = qrc_to_active_model(link)?;
        adaptive_qrc::Entity::update(active).exec(self.get_db()).await?;
        Ok(())
    }

    /// 删除链接及其扫码日志，返回被删链接的 id
    ///
    /// 访客记录的级联清理由调用方通过 VisitorTracker::purge_link 完成。
    pub async fn delete_qrc(&self, code: &str) -> Result<Option<String>> {
        let Some(model) = adaptive_qrc::Entity::find()
            .filter(adaptive_qrc::Column::Code.eq(code))
            .one(self.get_db())
            .await?
        else {
            return Ok(None);
        };

        adaptive_qrc::Entity::delete_by_id(model.id.clone())
            .exec(self.get_db())
            .await?;

        scan_log::Entity::delete_many()
            .filter(scan_log::Column::Code.eq(code))
            .exec(self.get_db())
            .await?;

        Ok(Some(model.id))
    }

    /// 分页列出链接（按创建时间倒序），page 从 1 开始
    pub async fn list_qrcs(&self, page: u64, page_size: u64) -> Result<QrcPage> {
        let paginator = adaptive_qrc::Entity::find()
            .order_by_desc(adaptive_qrc::Column::CreatedAt)
            .paginate(self.get_db(), Ord::max(page_size, 1));

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page.saturating_sub(1)).await?;

        let items = models
            .into_iter()
            .map(model_to_qrc)
            .collect::<Result<Vec<_>>>()?;

        Ok(QrcPage { items, total })
    }

    /// 批量累加扫码计数（扫码刷盘路径）
    pub async fn increment_scan_counts(&self, updates: &[(String, usize)]) -> Result<()> {
        for (code, count) in updates {
            adaptive_qrc::Entity::update_many()
                .col_expr(
                    adaptive_qrc::Column::ScanCount,
                    Expr::col(adaptive_qrc::Column::ScanCount).add(*count as i64),
                )
                .filter(adaptive_qrc::Column::Code.eq(code))
                .exec(self.get_db())
                .await?;
        }
        Ok(())
    }

    /// 批量写入详细扫码日志
    pub async fn insert_scan_logs(&self, details: Vec<ScanDetail>) -> Result<()> {
        if details.is_empty() {
            return Ok(());
        }

        let models: Vec<scan_log::ActiveModel> = details
            .into_iter()
            .map(|d| scan_log::ActiveModel {
                id: NotSet,
                code: Set(d.code),
                slot_id: Set(d.slot_id),
                matched_rule: Set(d.matched_rule),
                scanned_at: Set(d.timestamp),
                referrer: Set(d.referrer),
                user_agent: Set(d.user_agent),
                ip_address: Set(d.ip_address),
                country: Set(d.country),
                city: Set(d.city),
            })
            .collect();

        scan_log::Entity::insert_many(models)
            .exec(self.get_db())
            .await?;
        Ok(())
    }

    /// 单链接最近扫码记录（倒序）
    pub async fn recent_scans(&self, code: &str, limit: u64) -> Result<Vec<scan_log::Model>> {
        let logs = scan_log::Entity::find()
            .filter(scan_log::Column::Code.eq(code))
            .order_by_desc(scan_log::Column::ScannedAt)
            .limit(limit)
            .all(self.get_db())
            .await?;
        Ok(logs)
    }

    /// 单链接扫码日志总数
    pub async fn total_scans(&self, code: &str) -> Result<u64> {
        let count = scan_log::Entity::find()
            .filter(scan_log::Column::Code.eq(code))
            .count(self.get_db())
            .await?;
        Ok(count)
    }

    /// 短码是否已被占用
    pub async fn code_exists(&self, code: &str) -> Result<bool> {
        let count = adaptive_qrc::Entity::find()
            .filter(adaptive_qrc::Column::Code.eq(code))
            .count(self.get_db())
            .await?;
        Ok(count > 0)
    }
}
