//! # Data Models
//!
//! SeaORM entities for every table of the Outreach CRM schema, plus the small
//! service-level response types.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod additional_activity;
pub mod company;
pub mod company_tag;
pub mod engagement;
pub mod file;
pub mod follow_up_action;
pub mod resource;
pub mod resource_distribution;
pub mod tag;

pub use additional_activity::Entity as AdditionalActivity;
pub use company::Entity as Company;
pub use company_tag::Entity as CompanyTag;
pub use engagement::Entity as Engagement;
pub use file::Entity as File;
pub use follow_up_action::Entity as FollowUpAction;
pub use resource::Entity as Resource;
pub use resource_distribution::Entity as ResourceDistribution;
pub use tag::Entity as Tag;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    /// "ok" when the database answers
    #[schema(example = "ok")]
    pub status: String,
}
