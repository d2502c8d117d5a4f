//! Tag entity model
//!
//! A tag is a (name, type) pair such as ("Digital", "Sector"). The pair is
//! unique; companies link to tags through `company_tags`.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Label shown to users
    pub name: String,

    /// Category of the tag, e.g. "Sector", "Location"
    pub tag_type: String,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::company_tag::Entity")]
    CompanyTag,
}

impl Related<super::company_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CompanyTag.def()
    }
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        super::company_tag::Relation::Company.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::company_tag::Relation::Tag.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
