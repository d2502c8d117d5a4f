//! Migration to create the engagements and follow_up_actions tables.
//!
//! Engagements belong to a company; follow-up actions belong to an engagement.
//! Both foreign keys cascade so deleting a company removes the whole subtree.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Engagements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Engagements::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Engagements::CompanyId).big_integer().not_null())
                    .col(ColumnDef::new(Engagements::DateOfContact).date().null())
                    .col(ColumnDef::new(Engagements::EngagementType).text().null())
                    .col(ColumnDef::new(Engagements::Status).text().null())
                    .col(ColumnDef::new(Engagements::Notes).text().null())
                    .col(ColumnDef::new(Engagements::Outcome).text().null())
                    .col(
                        ColumnDef::new(Engagements::ResourcesSent)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Engagements::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Engagements::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_engagements_company_id")
                            .from(Engagements::Table, Engagements::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_engagements_company_id")
                    .table(Engagements::Table)
                    .col(Engagements::CompanyId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FollowUpActions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FollowUpActions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FollowUpActions::EngagementId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FollowUpActions::Description).text().not_null())
                    .col(ColumnDef::new(FollowUpActions::DueDate).date().null())
                    .col(
                        ColumnDef::new(FollowUpActions::Completed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(FollowUpActions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(FollowUpActions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_follow_up_actions_engagement_id")
                            .from(FollowUpActions::Table, FollowUpActions::EngagementId)
                            .to(Engagements::Table, Engagements::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_follow_up_actions_engagement_id")
                    .table(FollowUpActions::Table)
                    .col(FollowUpActions::EngagementId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FollowUpActions::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Engagements::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Engagements {
    Table,
    Id,
    CompanyId,
    DateOfContact,
    EngagementType,
    Status,
    Notes,
    Outcome,
    ResourcesSent,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum FollowUpActions {
    Table,
    Id,
    EngagementId,
    Description,
    DueDate,
    Completed,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Companies {
    Table,
    Id,
}
