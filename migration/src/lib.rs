//! Database migrations for the Outreach CRM API.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_01_06_000001_create_companies;
mod m2025_01_06_000002_create_engagements;
mod m2025_01_06_000003_create_additional_activities;
mod m2025_01_06_000004_create_files;
mod m2025_01_06_000005_create_tags;
mod m2025_01_06_000006_create_resources;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_01_06_000001_create_companies::Migration),
            Box::new(m2025_01_06_000002_create_engagements::Migration),
            Box::new(m2025_01_06_000003_create_additional_activities::Migration),
            Box::new(m2025_01_06_000004_create_files::Migration),
            Box::new(m2025_01_06_000005_create_tags::Migration),
            Box::new(m2025_01_06_000006_create_resources::Migration),
        ]
    }
}
