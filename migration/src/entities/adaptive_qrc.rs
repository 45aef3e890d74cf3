//! Adaptive QRC entity
//!
//! slots / date_rules / first_return 列为 JSON 文本，由应用层解析为领域模型。

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "adaptive_qrcs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub code: String,
    pub owner: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub slots: String,
    #[sea_orm(column_type = "Text")]
    pub date_rules: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub first_return: Option<String>,
    pub default_slot: Option<String>,
    pub timezone: String,
    pub scan_count: i64,
    pub scan_limit: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
