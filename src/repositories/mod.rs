//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM operations
//! for database entities. Repositories borrow any [`sea_orm::ConnectionTrait`], so the
//! same code runs against the pool or inside a transaction.

pub mod activity;
pub mod company;
pub mod dashboard;
pub mod engagement;
pub mod file;
pub mod resource;
pub mod tag;

pub use activity::{ActivityFields, ActivityRepository, ActivityTotals};
pub use company::{CompanyFields, CompanyFilter, CompanyRepository};
pub use dashboard::{DashboardCounts, DashboardRepository};
pub use engagement::{
    EngagementFields, EngagementFilter, EngagementRepository, FollowUpFields, FollowUpFilter,
};
pub use file::{FileRepository, NewFile};
pub use resource::{NewDistribution, ResourceFields, ResourceRepository};
pub use tag::{TagRepository, TagWithCount};
