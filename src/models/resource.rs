//! Resource entity model
//!
//! A shareable learning resource (guide, video, toolkit) that can be
//! distributed to companies.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "resources")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Title (required)
    pub title: String,

    pub resource_type: Option<String>,
    pub description: Option<String>,

    /// Absolute URL of the resource, when hosted elsewhere
    pub link: Option<String>,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::resource_distribution::Entity")]
    ResourceDistribution,
}

impl Related<super::resource_distribution::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResourceDistribution.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
