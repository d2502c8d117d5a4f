//! Migration to create the additional_activities table.
//!
//! Records learning activities delivered to a company: boolean programme flags,
//! the number of learners reached and the monetary value of the contribution.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AdditionalActivities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AdditionalActivities::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AdditionalActivities::CompanyId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AdditionalActivities::ActivityDate).date().null())
                    .col(ColumnDef::new(AdditionalActivities::ActivityType).text().null())
                    .col(
                        ColumnDef::new(AdditionalActivities::ToolsDelivered)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(AdditionalActivities::WorkExperience)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AdditionalActivities::CareersTalk)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AdditionalActivities::Mentoring)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AdditionalActivities::Workshop)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AdditionalActivities::LearnerCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AdditionalActivities::MonetaryValue)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(AdditionalActivities::Notes).text().null())
                    .col(
                        ColumnDef::new(AdditionalActivities::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(AdditionalActivities::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_additional_activities_company_id")
                            .from(AdditionalActivities::Table, AdditionalActivities::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_additional_activities_company_id")
                    .table(AdditionalActivities::Table)
                    .col(AdditionalActivities::CompanyId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AdditionalActivities::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AdditionalActivities {
    Table,
    Id,
    CompanyId,
    ActivityDate,
    ActivityType,
    ToolsDelivered,
    WorkExperience,
    CareersTalk,
    Mentoring,
    Workshop,
    LearnerCount,
    MonetaryValue,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Companies {
    Table,
    Id,
}
