//! 扫码日志表迁移
//!
//! 创建 scan_logs 表用于存储详细的扫码记录，包括：
//! - 命中的内容槽与规则类型
//! - 来源 (referrer)
//! - 用户代理 (user_agent)
//! - IP 地址
//! - 地理位置信息 (country, city)

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ScanLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScanLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScanLogs::Code).string_len(255).not_null())
                    .col(ColumnDef::new(ScanLogs::SlotId).string_len(64).null())
                    .col(
                        ColumnDef::new(ScanLogs::MatchedRule)
                            .string_len(16)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ScanLogs::ScannedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ScanLogs::Referrer).text().null())
                    .col(ColumnDef::new(ScanLogs::UserAgent).text().null())
                    .col(ColumnDef::new(ScanLogs::IpAddress).string_len(45).null())
                    .col(ColumnDef::new(ScanLogs::Country).string_len(2).null())
                    .col(ColumnDef::new(ScanLogs::City).string_len(100).null())
                    .to_owned(),
            )
            .await?;

        // code 索引（单链接扫码历史查询）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_scan_logs_code")
                    .table(ScanLogs::Table)
                    .col(ScanLogs::Code)
                    .to_owned(),
            )
            .await?;

        // 时间索引（按时间段聚合查询）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_scan_logs_scanned_at")
                    .table(ScanLogs::Table)
                    .col(ScanLogs::ScannedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_scan_logs_scanned_at").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_scan_logs_code").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ScanLogs::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum ScanLogs {
    Table,
    Id,
    Code,
    SlotId,
    MatchedRule,
    ScannedAt,
    Referrer,
    UserAgent,
    IpAddress,
    Country,
    City,
}
