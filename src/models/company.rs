//! Company entity model
//!
//! This module contains the SeaORM entity model for the companies table,
//! the root record that engagements, activities, files and tag links hang off.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Company entity representing an organisation the programme works with
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "companies")]
pub struct Model {
    /// Unique identifier for the company (primary key)
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Display name (required)
    pub name: String,

    pub sector: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,

    /// Free-text engagement summary, e.g. "Active" or "Prospect"
    pub engagement_status: Option<String>,

    /// Date of the earliest recorded engagement
    pub first_engagement_date: Option<Date>,

    /// Date of the most recent recorded engagement
    pub last_engagement_date: Option<Date>,

    /// Sign-up categories, stored as JSON array text (see `crate::codec`)
    pub signup_categories: String,

    /// Timestamp when the company was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the company was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::engagement::Entity")]
    Engagement,
    #[sea_orm(has_many = "super::additional_activity::Entity")]
    AdditionalActivity,
    #[sea_orm(has_many = "super::file::Entity")]
    File,
    #[sea_orm(has_many = "super::company_tag::Entity")]
    CompanyTag,
    #[sea_orm(has_many = "super::resource_distribution::Entity")]
    ResourceDistribution,
}

impl Related<super::engagement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Engagement.def()
    }
}

impl Related<super::additional_activity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AdditionalActivity.def()
    }
}

impl Related<super::file::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::File.def()
    }
}

impl Related<super::company_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CompanyTag.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::company_tag::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::company_tag::Relation::Company.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
