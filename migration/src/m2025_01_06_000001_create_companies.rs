//! Migration to create the companies table.
//!
//! Companies are the root of the schema; engagements, activities, files and
//! tag links all hang off a company row and cascade with it.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Companies::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Companies::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Companies::Name).text().not_null())
                    .col(ColumnDef::new(Companies::Sector).text().null())
                    .col(ColumnDef::new(Companies::Location).text().null())
                    .col(ColumnDef::new(Companies::Website).text().null())
                    .col(ColumnDef::new(Companies::ContactName).text().null())
                    .col(ColumnDef::new(Companies::ContactEmail).text().null())
                    .col(ColumnDef::new(Companies::ContactPhone).text().null())
                    .col(ColumnDef::new(Companies::Address).text().null())
                    .col(ColumnDef::new(Companies::Notes).text().null())
                    .col(ColumnDef::new(Companies::EngagementStatus).text().null())
                    .col(ColumnDef::new(Companies::FirstEngagementDate).date().null())
                    .col(ColumnDef::new(Companies::LastEngagementDate).date().null())
                    .col(
                        ColumnDef::new(Companies::SignupCategories)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Companies::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Companies::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_companies_name")
                    .table(Companies::Table)
                    .col(Companies::Name)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_companies_name").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Companies::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Companies {
    Table,
    Id,
    Name,
    Sector,
    Location,
    Website,
    ContactName,
    ContactEmail,
    ContactPhone,
    Address,
    Notes,
    EngagementStatus,
    FirstEngagementDate,
    LastEngagementDate,
    SignupCategories,
    CreatedAt,
    UpdatedAt,
}
