//! # Engagements API Handlers
//!
//! Engagement CRUD with nested follow-up actions. An engagement, its follow-ups
//! and the owning company's engagement dates are written in one transaction.

use std::collections::HashMap;

use crate::codec::LabelList;
use crate::error::{ApiError, missing_field};
use crate::ids::{RecordId, de_optional_record_id};
use crate::models::engagement::Model as EngagementModel;
use crate::models::follow_up_action::Model as FollowUpModel;
use crate::repositories::{
    CompanyRepository, EngagementFields, EngagementFilter, EngagementRepository, FollowUpFields,
};
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ConnectionTrait, TransactionTrait};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::follow_ups::FollowUpDto;
use super::types::{
    ApiJson, clean_text, de_nullable_bool, de_nullable_date, merge, nullable, parse_id,
    parse_optional_id,
};

/// An engagement as returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EngagementDto {
    #[schema(value_type = String, example = "7")]
    pub id: RecordId,
    #[schema(value_type = String, example = "1060000000000000001")]
    pub company_id: RecordId,
    /// Name of the owning company
    pub company_name: Option<String>,
    pub date_of_contact: Option<NaiveDate>,
    #[schema(example = "Site visit")]
    pub engagement_type: Option<String>,
    #[schema(example = "Completed")]
    pub status: Option<String>,
    pub notes: Option<String>,
    pub outcome: Option<String>,
    #[schema(value_type = Vec<String>)]
    pub resources_sent: LabelList,
    pub follow_ups: Vec<FollowUpDto>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

impl EngagementDto {
    pub fn from_parts(
        engagement: EngagementModel,
        company_name: Option<String>,
        follow_ups: Vec<FollowUpModel>,
    ) -> Self {
        Self {
            id: engagement.id.into(),
            company_id: engagement.company_id.into(),
            company_name,
            date_of_contact: engagement.date_of_contact,
            engagement_type: engagement.engagement_type,
            status: engagement.status,
            notes: engagement.notes,
            outcome: engagement.outcome,
            resources_sent: LabelList::from_column(&engagement.resources_sent),
            follow_ups: follow_ups.into_iter().map(FollowUpDto::from).collect(),
            created_at: engagement.created_at,
            updated_at: engagement.updated_at,
        }
    }
}

/// Query parameters for listing engagements
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EngagementListQuery {
    /// Only engagements of this company
    pub company_id: Option<String>,
    /// Exact status match
    pub status: Option<String>,
}

/// A follow-up action inside an engagement payload.
/// With an `id` it updates that stored action; without one it creates a new action.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpRequest {
    #[serde(default, deserialize_with = "de_optional_record_id")]
    #[schema(value_type = Option<String>)]
    pub id: Option<RecordId>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de_nullable_date")]
    #[schema(value_type = Option<String>, format = Date)]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "de_nullable_bool")]
    #[schema(value_type = Option<bool>)]
    pub completed: Option<Option<bool>>,
}

impl FollowUpRequest {
    /// Overlay onto a stored action, or onto an empty one for new rows
    pub(crate) fn into_fields(self, stored: Option<&FollowUpModel>) -> FollowUpFields {
        let mut fields = stored
            .map(|model| FollowUpFields {
                id: Some(model.id),
                description: model.description.clone(),
                due_date: model.due_date,
                completed: model.completed,
            })
            .unwrap_or_default();

        merge(&mut fields.description, self.description);
        merge(&mut fields.due_date, self.due_date);
        merge(&mut fields.completed, self.completed.map(Option::unwrap_or_default));
        fields
    }
}

/// Request payload for creating or replacing an engagement.
///
/// On update, omitted fields keep their stored values. `followUps`, when present,
/// becomes the complete follow-up set.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EngagementRequest {
    #[serde(default, deserialize_with = "de_optional_record_id")]
    #[schema(value_type = Option<String>, example = "1060000000000000001")]
    pub company_id: Option<RecordId>,
    #[serde(default, deserialize_with = "de_nullable_date")]
    #[schema(value_type = Option<String>, format = Date)]
    pub date_of_contact: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub engagement_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub status: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub outcome: Option<Option<String>>,
    #[serde(default)]
    #[schema(value_type = Option<Vec<String>>)]
    pub resources_sent: Option<LabelList>,
    #[serde(default)]
    pub follow_ups: Option<Vec<FollowUpRequest>>,
}

impl EngagementRequest {
    fn apply_to(self, fields: &mut EngagementFields) -> Option<Vec<FollowUpRequest>> {
        merge(&mut fields.company_id, self.company_id.map(RecordId::get));
        merge(&mut fields.date_of_contact, self.date_of_contact);
        merge(&mut fields.engagement_type, self.engagement_type.map(clean_text));
        merge(&mut fields.status, self.status.map(clean_text));
        merge(&mut fields.notes, self.notes.map(clean_text));
        merge(&mut fields.outcome, self.outcome.map(clean_text));
        merge(
            &mut fields.resources_sent,
            self.resources_sent.map(LabelList::into_inner),
        );
        self.follow_ups
    }
}

async fn company_names<C: ConnectionTrait>(
    db: &C,
    engagements: &[EngagementModel],
) -> Result<HashMap<i64, String>, ApiError> {
    let mut ids: Vec<i64> = engagements.iter().map(|e| e.company_id).collect();
    ids.sort_unstable();
    ids.dedup();

    Ok(CompanyRepository::new(db)
        .find_many(&ids)
        .await?
        .into_iter()
        .map(|company| (company.id, company.name))
        .collect())
}

/// List engagements, most recent contact first
#[utoipa::path(
    get,
    path = "/engagements",
    security(("bearer_auth" = [])),
    params(EngagementListQuery),
    responses(
        (status = 200, description = "Engagements with company names and follow-ups", body = [EngagementDto]),
        (status = 400, description = "Invalid companyId", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "engagements"
)]
pub async fn list_engagements(
    State(state): State<AppState>,
    Query(query): Query<EngagementListQuery>,
) -> Result<Json<Vec<EngagementDto>>, ApiError> {
    let filter = EngagementFilter {
        company_id: parse_optional_id(query.company_id.as_deref())?,
        status: query.status,
    };

    let repo = EngagementRepository::new(&state.db);
    let engagements = repo.list(&filter).await?;
    let ids: Vec<i64> = engagements.iter().map(|e| e.id).collect();
    let mut follow_ups = repo.follow_ups_for(&ids).await?;
    let names = company_names(&state.db, &engagements).await?;

    let items = engagements
        .into_iter()
        .map(|engagement| {
            let name = names.get(&engagement.company_id).cloned();
            let actions = follow_ups.remove(&engagement.id).unwrap_or_default();
            EngagementDto::from_parts(engagement, name, actions)
        })
        .collect();

    Ok(Json(items))
}

/// Record an engagement with optional follow-up actions
#[utoipa::path(
    post,
    path = "/engagements",
    security(("bearer_auth" = [])),
    request_body = EngagementRequest,
    responses(
        (status = 201, description = "Engagement created", body = EngagementDto),
        (status = 400, description = "companyId missing or payload invalid", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Company not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "engagements"
)]
pub async fn create_engagement(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<EngagementRequest>,
) -> Result<(StatusCode, Json<EngagementDto>), ApiError> {
    let company_id = request.company_id.ok_or_else(|| missing_field("companyId"))?.get();

    let mut fields = EngagementFields::default();
    let follow_ups: Vec<FollowUpFields> = request
        .apply_to(&mut fields)
        .unwrap_or_default()
        .into_iter()
        .map(|follow_up| follow_up.into_fields(None))
        .collect();

    let txn = state.db.begin().await?;
    let companies = CompanyRepository::new(&txn);
    let company = companies.get(company_id).await?;

    let repo = EngagementRepository::new(&txn);
    let engagement = repo.create(fields).await?;
    let actions = repo.add_follow_ups(engagement.id, follow_ups).await?;
    if let Some(date) = engagement.date_of_contact {
        companies.record_engagement_date(company_id, date).await?;
    }
    txn.commit().await?;

    tracing::info!(
        engagement_id = engagement.id,
        company_id,
        follow_ups = actions.len(),
        "Recorded engagement"
    );

    Ok((
        StatusCode::CREATED,
        Json(EngagementDto::from_parts(engagement, Some(company.name), actions)),
    ))
}

/// Get an engagement with its follow-up actions
#[utoipa::path(
    get,
    path = "/engagements/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Engagement id")),
    responses(
        (status = 200, description = "Engagement", body = EngagementDto),
        (status = 400, description = "Invalid id", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Engagement not found", body = ApiError)
    ),
    tag = "engagements"
)]
pub async fn get_engagement(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EngagementDto>, ApiError> {
    let id = parse_id(&id)?;
    let repo = EngagementRepository::new(&state.db);
    let engagement = repo.get(id).await?;
    let actions = repo.follow_ups_for(&[id]).await?.remove(&id).unwrap_or_default();
    let name = CompanyRepository::new(&state.db)
        .find_by_id(engagement.company_id)
        .await?
        .map(|company| company.name);

    Ok(Json(EngagementDto::from_parts(engagement, name, actions)))
}

/// Replace an engagement; omitted fields keep their stored values
#[utoipa::path(
    put,
    path = "/engagements/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Engagement id")),
    request_body = EngagementRequest,
    responses(
        (status = 200, description = "Engagement updated", body = EngagementDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Engagement, company or follow-up not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "engagements"
)]
pub async fn update_engagement(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<EngagementRequest>,
) -> Result<Json<EngagementDto>, ApiError> {
    let id = parse_id(&id)?;

    let txn = state.db.begin().await?;
    let repo = EngagementRepository::new(&txn);
    let existing = repo.get(id).await?;

    let mut fields = EngagementFields::from(&existing);
    let follow_ups = request.apply_to(&mut fields);

    let companies = CompanyRepository::new(&txn);
    let company = companies.get(fields.company_id).await?;
    let engagement = repo.update(id, fields).await?;

    let actions = match follow_ups {
        Some(requested) => {
            let mut stored: HashMap<i64, FollowUpModel> = repo
                .follow_ups_for(&[id])
                .await?
                .remove(&id)
                .unwrap_or_default()
                .into_iter()
                .map(|model| (model.id, model))
                .collect();
            let replacement = requested
                .into_iter()
                .map(|follow_up| {
                    let current = follow_up.id.and_then(|fid| stored.remove(&fid.get()));
                    let explicit_id = follow_up.id.map(RecordId::get);
                    let mut fields = follow_up.into_fields(current.as_ref());
                    fields.id = explicit_id;
                    fields
                })
                .collect();
            repo.replace_follow_ups(id, replacement).await?
        }
        None => repo.follow_ups_for(&[id]).await?.remove(&id).unwrap_or_default(),
    };

    if let Some(date) = engagement.date_of_contact {
        companies.record_engagement_date(engagement.company_id, date).await?;
    }
    txn.commit().await?;

    Ok(Json(EngagementDto::from_parts(engagement, Some(company.name), actions)))
}

/// Delete an engagement; its follow-up actions cascade
#[utoipa::path(
    delete,
    path = "/engagements/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Engagement id")),
    responses(
        (status = 204, description = "Engagement deleted"),
        (status = 400, description = "Invalid id", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Engagement not found", body = ApiError)
    ),
    tag = "engagements"
)]
pub async fn delete_engagement(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    EngagementRepository::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
