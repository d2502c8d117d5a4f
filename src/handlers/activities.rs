//! # Activities API Handlers
//!
//! Additional learning activities. Creating an activity for a company that
//! does not exist is a 404 and inserts nothing.

use crate::codec::LabelList;
use crate::error::{ApiError, missing_field};
use crate::ids::{RecordId, de_optional_record_id};
use crate::models::additional_activity::Model as ActivityModel;
use crate::repositories::{ActivityFields, ActivityRepository, CompanyRepository};
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use sea_orm::TransactionTrait;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::types::{
    ApiJson, clean_text, de_nullable_bool, de_nullable_date, de_nullable_number, merge, nullable,
    parse_id, parse_optional_id,
};

/// An activity as returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDto {
    #[schema(value_type = String, example = "5")]
    pub id: RecordId,
    #[schema(value_type = String, example = "1060000000000000001")]
    pub company_id: RecordId,
    pub activity_date: Option<NaiveDate>,
    #[schema(example = "Workshop")]
    pub activity_type: Option<String>,
    #[schema(value_type = Vec<String>)]
    pub tools_delivered: LabelList,
    pub work_experience: bool,
    pub careers_talk: bool,
    pub mentoring: bool,
    pub workshop: bool,
    #[schema(example = 30)]
    pub learner_count: i32,
    #[schema(example = 250.0)]
    pub monetary_value: f64,
    pub notes: Option<String>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

impl From<ActivityModel> for ActivityDto {
    fn from(model: ActivityModel) -> Self {
        Self {
            id: model.id.into(),
            company_id: model.company_id.into(),
            activity_date: model.activity_date,
            activity_type: model.activity_type,
            tools_delivered: LabelList::from_column(&model.tools_delivered),
            work_experience: model.work_experience,
            careers_talk: model.careers_talk,
            mentoring: model.mentoring,
            workshop: model.workshop,
            learner_count: model.learner_count,
            monetary_value: model.monetary_value,
            notes: model.notes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Query parameters for listing activities
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ActivityListQuery {
    /// Only activities of this company
    pub company_id: Option<String>,
}

/// Request payload for creating or replacing an activity.
/// On update, omitted fields keep their stored values.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRequest {
    #[serde(default, deserialize_with = "de_optional_record_id")]
    #[schema(value_type = Option<String>)]
    pub company_id: Option<RecordId>,
    #[serde(default, deserialize_with = "de_nullable_date")]
    #[schema(value_type = Option<String>, format = Date)]
    pub activity_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub activity_type: Option<Option<String>>,
    #[serde(default)]
    #[schema(value_type = Option<Vec<String>>)]
    pub tools_delivered: Option<LabelList>,
    #[serde(default, deserialize_with = "de_nullable_bool")]
    #[schema(value_type = Option<bool>)]
    pub work_experience: Option<Option<bool>>,
    #[serde(default, deserialize_with = "de_nullable_bool")]
    #[schema(value_type = Option<bool>)]
    pub careers_talk: Option<Option<bool>>,
    #[serde(default, deserialize_with = "de_nullable_bool")]
    #[schema(value_type = Option<bool>)]
    pub mentoring: Option<Option<bool>>,
    #[serde(default, deserialize_with = "de_nullable_bool")]
    #[schema(value_type = Option<bool>)]
    pub workshop: Option<Option<bool>>,
    #[serde(default, deserialize_with = "de_nullable_number")]
    #[schema(value_type = Option<i32>)]
    pub learner_count: Option<Option<i32>>,
    #[serde(default, deserialize_with = "de_nullable_number")]
    #[schema(value_type = Option<f64>)]
    pub monetary_value: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
}

impl ActivityRequest {
    fn apply_to(self, fields: &mut ActivityFields) {
        merge(&mut fields.company_id, self.company_id.map(RecordId::get));
        merge(&mut fields.activity_date, self.activity_date);
        merge(&mut fields.activity_type, self.activity_type.map(clean_text));
        merge(
            &mut fields.tools_delivered,
            self.tools_delivered.map(LabelList::into_inner),
        );
        merge(&mut fields.work_experience, self.work_experience.map(Option::unwrap_or_default));
        merge(&mut fields.careers_talk, self.careers_talk.map(Option::unwrap_or_default));
        merge(&mut fields.mentoring, self.mentoring.map(Option::unwrap_or_default));
        merge(&mut fields.workshop, self.workshop.map(Option::unwrap_or_default));
        merge(&mut fields.learner_count, self.learner_count.map(Option::unwrap_or_default));
        merge(&mut fields.monetary_value, self.monetary_value.map(Option::unwrap_or_default));
        merge(&mut fields.notes, self.notes.map(clean_text));
    }
}

/// List activities, most recent first
#[utoipa::path(
    get,
    path = "/activities",
    security(("bearer_auth" = [])),
    params(ActivityListQuery),
    responses(
        (status = 200, description = "Activities", body = [ActivityDto]),
        (status = 400, description = "Invalid companyId", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "activities"
)]
pub async fn list_activities(
    State(state): State<AppState>,
    Query(query): Query<ActivityListQuery>,
) -> Result<Json<Vec<ActivityDto>>, ApiError> {
    let company_id = parse_optional_id(query.company_id.as_deref())?;
    let activities = ActivityRepository::new(&state.db).list(company_id).await?;
    Ok(Json(activities.into_iter().map(ActivityDto::from).collect()))
}

/// Record an activity for a company
#[utoipa::path(
    post,
    path = "/activities",
    security(("bearer_auth" = [])),
    request_body = ActivityRequest,
    responses(
        (status = 201, description = "Activity created", body = ActivityDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Company not found", body = ApiError)
    ),
    tag = "activities"
)]
pub async fn create_activity(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ActivityRequest>,
) -> Result<(StatusCode, Json<ActivityDto>), ApiError> {
    let company_id = request.company_id.ok_or_else(|| missing_field("companyId"))?;

    let mut fields = ActivityFields::default();
    request.apply_to(&mut fields);

    let txn = state.db.begin().await?;
    CompanyRepository::new(&txn).ensure_exists(company_id.get()).await?;
    let activity = ActivityRepository::new(&txn).create(fields).await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(activity.into())))
}

/// Get an activity
#[utoipa::path(
    get,
    path = "/activities/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Activity id")),
    responses(
        (status = 200, description = "Activity", body = ActivityDto),
        (status = 400, description = "Invalid id", body = ApiError),
        (status = 404, description = "Activity not found", body = ApiError)
    ),
    tag = "activities"
)]
pub async fn get_activity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ActivityDto>, ApiError> {
    let id = parse_id(&id)?;
    let activity = ActivityRepository::new(&state.db).get(id).await?;
    Ok(Json(activity.into()))
}

/// Replace an activity; omitted fields keep their stored values
#[utoipa::path(
    put,
    path = "/activities/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Activity id")),
    request_body = ActivityRequest,
    responses(
        (status = 200, description = "Activity updated", body = ActivityDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Activity or company not found", body = ApiError)
    ),
    tag = "activities"
)]
pub async fn update_activity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<ActivityRequest>,
) -> Result<Json<ActivityDto>, ApiError> {
    let id = parse_id(&id)?;

    let txn = state.db.begin().await?;
    let repo = ActivityRepository::new(&txn);
    let existing = repo.get(id).await?;

    let mut fields = ActivityFields::from(&existing);
    request.apply_to(&mut fields);
    if fields.company_id != existing.company_id {
        CompanyRepository::new(&txn).ensure_exists(fields.company_id).await?;
    }

    let activity = repo.update(id, fields).await?;
    txn.commit().await?;

    Ok(Json(activity.into()))
}

/// Delete an activity
#[utoipa::path(
    delete,
    path = "/activities/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Activity id")),
    responses(
        (status = 204, description = "Activity deleted"),
        (status = 400, description = "Invalid id", body = ApiError),
        (status = 404, description = "Activity not found", body = ApiError)
    ),
    tag = "activities"
)]
pub async fn delete_activity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    ActivityRepository::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
