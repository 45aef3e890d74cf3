//! 访客记录表迁移
//!
//! 创建 visitor_records 表，按 (link_id, fingerprint) 记录首次扫码时间。
//! 唯一索引是 first/return 分类原子性的关键：并发首扫通过
//! INSERT ... ON CONFLICT DO NOTHING 串行化，只有一个请求观察到首次访问。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VisitorRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VisitorRecords::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(VisitorRecords::LinkId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VisitorRecords::Fingerprint)
                            .char_len(16) // xxHash64 hex 表示
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VisitorRecords::FirstSeenAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // (link_id, fingerprint) 唯一索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_visitor_link_fingerprint")
                    .table(VisitorRecords::Table)
                    .col(VisitorRecords::LinkId)
                    .col(VisitorRecords::Fingerprint)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("uq_visitor_link_fingerprint").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(VisitorRecords::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum VisitorRecords {
    Table,
    Id,
    LinkId,
    Fingerprint,
    FirstSeenAt,
}
