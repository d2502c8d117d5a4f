//! # Dashboard Repository
//!
//! Aggregate counts across every table for the dashboard summary.

use crate::error::RepositoryError;
use crate::models::{
    AdditionalActivity, Company, Engagement, File, FollowUpAction, Resource, ResourceDistribution,
    Tag, follow_up_action,
};
use chrono::NaiveDate;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};

/// Row counts shown on the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardCounts {
    pub companies: u64,
    pub engagements: u64,
    pub activities: u64,
    pub resources: u64,
    pub tags: u64,
    pub files: u64,
    pub distributions: u64,
    pub open_follow_ups: u64,
    pub overdue_follow_ups: u64,
}

pub struct DashboardRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> DashboardRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Count every table; follow-ups due before `today` and still open are overdue
    pub async fn counts(&self, today: NaiveDate) -> Result<DashboardCounts, RepositoryError> {
        let open = FollowUpAction::find().filter(follow_up_action::Column::Completed.eq(false));

        Ok(DashboardCounts {
            companies: Company::find().count(self.db).await?,
            engagements: Engagement::find().count(self.db).await?,
            activities: AdditionalActivity::find().count(self.db).await?,
            resources: Resource::find().count(self.db).await?,
            tags: Tag::find().count(self.db).await?,
            files: File::find().count(self.db).await?,
            distributions: ResourceDistribution::find().count(self.db).await?,
            open_follow_ups: open.clone().count(self.db).await?,
            overdue_follow_ups: open
                .filter(follow_up_action::Column::DueDate.lt(today))
                .count(self.db)
                .await?,
        })
    }
}
