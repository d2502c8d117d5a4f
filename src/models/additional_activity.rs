//! Additional learning activity entity model
//!
//! Records the flags, learner count and monetary value of programme activity
//! delivered to a company outside of a regular engagement.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "additional_activities")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub company_id: i64,
    pub activity_date: Option<Date>,
    pub activity_type: Option<String>,

    /// Tools delivered, JSON array text
    pub tools_delivered: String,

    pub work_experience: bool,
    pub careers_talk: bool,
    pub mentoring: bool,
    pub workshop: bool,

    /// Number of learners reached (never negative)
    pub learner_count: i32,

    /// Monetary value of the activity (never negative)
    #[sea_orm(column_type = "Double")]
    pub monetary_value: f64,

    pub notes: Option<String>,
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
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
