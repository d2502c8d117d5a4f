//! # Follow-up Actions API Handlers

use crate::error::ApiError;
use crate::ids::RecordId;
use crate::models::follow_up_action::Model as FollowUpModel;
use crate::repositories::{EngagementRepository, FollowUpFilter};
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::NaiveDate;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::engagements::FollowUpRequest;
use super::types::{ApiJson, parse_id, parse_query_bool, parse_query_date};

/// A follow-up action as returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpDto {
    #[schema(value_type = String, example = "11")]
    pub id: RecordId,
    #[schema(value_type = String, example = "7")]
    pub engagement_id: RecordId,
    #[schema(example = "Send the careers pack")]
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

impl From<FollowUpModel> for FollowUpDto {
    fn from(model: FollowUpModel) -> Self {
        Self {
            id: model.id.into(),
            engagement_id: model.engagement_id.into(),
            description: model.description,
            due_date: model.due_date,
            completed: model.completed,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Query parameters for listing follow-up actions
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FollowUpListQuery {
    /// `true` or `false`
    pub completed: Option<String>,
    /// Only actions due before this date (YYYY-MM-DD)
    pub due_before: Option<String>,
}

/// List follow-up actions across all engagements, soonest due first
#[utoipa::path(
    get,
    path = "/follow-ups",
    security(("bearer_auth" = [])),
    params(FollowUpListQuery),
    responses(
        (status = 200, description = "Follow-up actions", body = [FollowUpDto]),
        (status = 400, description = "Invalid filter", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "engagements"
)]
pub async fn list_follow_ups(
    State(state): State<AppState>,
    Query(query): Query<FollowUpListQuery>,
) -> Result<Json<Vec<FollowUpDto>>, ApiError> {
    let filter = FollowUpFilter {
        completed: parse_query_bool("completed", query.completed.as_deref())?,
        due_before: parse_query_date("dueBefore", query.due_before.as_deref())?,
    };

    let actions = EngagementRepository::new(&state.db)
        .list_follow_ups(&filter)
        .await?;

    Ok(Json(actions.into_iter().map(FollowUpDto::from).collect()))
}

/// Update one follow-up action; omitted fields keep their stored values
#[utoipa::path(
    put,
    path = "/follow-ups/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Follow-up action id")),
    request_body = FollowUpRequest,
    responses(
        (status = 200, description = "Follow-up action updated", body = FollowUpDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Follow-up action not found", body = ApiError)
    ),
    tag = "engagements"
)]
pub async fn update_follow_up(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<FollowUpRequest>,
) -> Result<Json<FollowUpDto>, ApiError> {
    let id = parse_id(&id)?;
    let repo = EngagementRepository::new(&state.db);

    let stored = repo.get_follow_up(id).await?;
    let fields = request.into_fields(Some(&stored));
    let updated = repo.update_follow_up(id, fields).await?;

    Ok(Json(updated.into()))
}
