use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 adaptive_qrcs 表
        //
        // slots / date_rules / first_return 以 JSON 文本存储，
        // 解析由应用层的 converters 负责。
        manager
            .create_table(
                Table::create()
                    .table(AdaptiveQrcs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AdaptiveQrcs::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AdaptiveQrcs::Code)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(AdaptiveQrcs::Owner).string_len(255).null())
                    .col(ColumnDef::new(AdaptiveQrcs::Slots).text().not_null())
                    .col(ColumnDef::new(AdaptiveQrcs::DateRules).text().not_null())
                    .col(ColumnDef::new(AdaptiveQrcs::FirstReturn).text().null())
                    .col(
                        ColumnDef::new(AdaptiveQrcs::DefaultSlot)
                            .string_len(64)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(AdaptiveQrcs::Timezone)
                            .string_len(64)
                            .not_null()
                            .default("UTC"),
                    )
                    .col(
                        ColumnDef::new(AdaptiveQrcs::ScanCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AdaptiveQrcs::ScanLimit)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AdaptiveQrcs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdaptiveQrcs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建创建时间索引（列表页按创建时间排序）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_qrcs_created_at")
                    .table(AdaptiveQrcs::Table)
                    .col(AdaptiveQrcs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_qrcs_created_at").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(AdaptiveQrcs::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum AdaptiveQrcs {
    Table,
    Id,
    Code,
    Owner,
    Slots,
    DateRules,
    FirstReturn,
    DefaultSlot,
    Timezone,
    ScanCount,
    ScanLimit,
    CreatedAt,
    UpdatedAt,
}
