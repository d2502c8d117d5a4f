//! Migration to create the resources and resource_distributions tables.
//!
//! A distribution links a resource to a recipient company, optionally recording
//! the tag through which the company was reached. The unique
//! (resource_id, company_id) index keeps one record per recipient.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Resources::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Resources::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Resources::Title).text().not_null())
                    .col(ColumnDef::new(Resources::ResourceType).text().null())
                    .col(ColumnDef::new(Resources::Description).text().null())
                    .col(ColumnDef::new(Resources::Link).text().null())
                    .col(
                        ColumnDef::new(Resources::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Resources::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ResourceDistributions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ResourceDistributions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ResourceDistributions::ResourceId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ResourceDistributions::CompanyId)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(ResourceDistributions::TagId).big_integer().null())
                    .col(
                        ColumnDef::new(ResourceDistributions::SentDate)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ResourceDistributions::ClickCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ResourceDistributions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ResourceDistributions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_resource_distributions_resource_id")
                            .from(ResourceDistributions::Table, ResourceDistributions::ResourceId)
                            .to(Resources::Table, Resources::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_resource_distributions_company_id")
                            .from(ResourceDistributions::Table, ResourceDistributions::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_resource_distributions_tag_id")
                            .from(ResourceDistributions::Table, ResourceDistributions::TagId)
                            .to(Tags::Table, Tags::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_resource_distributions_resource_company")
                    .table(ResourceDistributions::Table)
                    .col(ResourceDistributions::ResourceId)
                    .col(ResourceDistributions::CompanyId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ResourceDistributions::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Resources::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Resources {
    Table,
    Id,
    Title,
    ResourceType,
    Description,
    Link,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ResourceDistributions {
    Table,
    Id,
    ResourceId,
    CompanyId,
    TagId,
    SentDate,
    ClickCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Companies {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Tags {
    Table,
    Id,
}
