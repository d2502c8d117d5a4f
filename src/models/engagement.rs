//! Engagement entity model
//!
//! A recorded contact between the programme and a company. Deleting the
//! company cascades to its engagements, and from there to follow-up actions.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "engagements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Owning company
    pub company_id: i64,

    pub date_of_contact: Option<Date>,
    pub engagement_type: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub outcome: Option<String>,

    /// Resources handed over during the contact, JSON array text
    pub resources_sent: String,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::CompanyId",
        to = "super::company::Column::Id",
        on_delete = "Cascade"
    )]
    Company,
    #[sea_orm(has_many = "super::follow_up_action::Entity")]
    FollowUpAction,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<super::follow_up_action::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FollowUpAction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
