//! # Dashboard API Handler

use std::collections::HashMap;

use crate::error::ApiError;
use crate::repositories::{
    ActivityRepository, CompanyRepository, DashboardCounts, DashboardRepository,
    EngagementRepository, ResourceRepository, TagRepository,
};
use crate::server::AppState;
use axum::{extract::State, response::Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::companies::CompanyDto;
use super::engagements::EngagementDto;
use super::follow_ups::FollowUpDto;
use super::tags::TagDto;

const RECENT_LIMIT: u64 = 5;

/// Row counts across the programme
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CountsDto {
    pub companies: u64,
    pub engagements: u64,
    pub activities: u64,
    pub resources: u64,
    pub tags: u64,
    pub files: u64,
    pub distributions: u64,
    /// Follow-up actions not yet completed
    pub open_follow_ups: u64,
    /// Open follow-up actions whose due date has passed
    pub overdue_follow_ups: u64,
}

impl From<DashboardCounts> for CountsDto {
    fn from(counts: DashboardCounts) -> Self {
        Self {
            companies: counts.companies,
            engagements: counts.engagements,
            activities: counts.activities,
            resources: counts.resources,
            tags: counts.tags,
            files: counts.files,
            distributions: counts.distributions,
            open_follow_ups: counts.open_follow_ups,
            overdue_follow_ups: counts.overdue_follow_ups,
        }
    }
}

/// Programme reach
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TotalsDto {
    pub learners_reached: i64,
    pub monetary_value: f64,
    pub resource_clicks: i64,
}

/// Dashboard summary
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDto {
    pub counts: CountsDto,
    pub totals: TotalsDto,
    pub recent_companies: Vec<CompanyDto>,
    pub recent_engagements: Vec<EngagementDto>,
    pub upcoming_follow_ups: Vec<FollowUpDto>,
}

/// Summary counts, totals and recent activity
#[utoipa::path(
    get,
    path = "/dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard summary", body = DashboardDto),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "dashboard"
)]
pub async fn get_dashboard(State(state): State<AppState>) -> Result<Json<DashboardDto>, ApiError> {
    let db = &state.db;
    let today = Utc::now().date_naive();

    let counts = DashboardRepository::new(db).counts(today).await?;
    let activity_totals = ActivityRepository::new(db).totals().await?;
    let resource_clicks = ResourceRepository::new(db).total_clicks().await?;

    let companies = CompanyRepository::new(db);
    let recent = companies.recent(RECENT_LIMIT).await?;
    let company_ids: Vec<i64> = recent.iter().map(|company| company.id).collect();
    let mut tags = TagRepository::new(db).tags_for_companies(&company_ids).await?;
    let recent_companies = recent
        .into_iter()
        .map(|company| {
            let company_tags = tags
                .remove(&company.id)
                .unwrap_or_default()
                .into_iter()
                .map(TagDto::from)
                .collect();
            CompanyDto::from_model(company, company_tags)
        })
        .collect();

    let engagements = EngagementRepository::new(db);
    let recent_engagements = engagements.recent(RECENT_LIMIT).await?;
    let engagement_ids: Vec<i64> = recent_engagements.iter().map(|e| e.id).collect();
    let mut follow_ups = engagements.follow_ups_for(&engagement_ids).await?;

    let mut owner_ids: Vec<i64> = recent_engagements.iter().map(|e| e.company_id).collect();
    owner_ids.sort_unstable();
    owner_ids.dedup();
    let names: HashMap<i64, String> = companies
        .find_many(&owner_ids)
        .await?
        .into_iter()
        .map(|company| (company.id, company.name))
        .collect();

    let recent_engagements = recent_engagements
        .into_iter()
        .map(|engagement| {
            let name = names.get(&engagement.company_id).cloned();
            let actions = follow_ups.remove(&engagement.id).unwrap_or_default();
            EngagementDto::from_parts(engagement, name, actions)
        })
        .collect();

    let upcoming_follow_ups = engagements
        .upcoming_follow_ups(RECENT_LIMIT)
        .await?
        .into_iter()
        .map(FollowUpDto::from)
        .collect();

    Ok(Json(DashboardDto {
        counts: counts.into(),
        totals: TotalsDto {
            learners_reached: activity_totals.learners_reached,
            monetary_value: activity_totals.monetary_value,
            resource_clicks,
        },
        recent_companies,
        recent_engagements,
        upcoming_follow_ups,
    }))
}
