//! # Tags API Handlers
//!
//! Tag listing and creation, plus attaching and detaching tags on a company.

use crate::error::{ApiError, missing_field};
use crate::ids::{RecordId, de_optional_record_id};
use crate::models::tag::Model as TagModel;
use crate::repositories::{CompanyRepository, TagRepository, TagWithCount};
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use sea_orm::TransactionTrait;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::types::{ApiJson, parse_id};

/// A tag as returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TagDto {
    #[schema(value_type = String, example = "42")]
    pub id: RecordId,
    #[schema(example = "Digital")]
    pub name: String,
    /// Category of the tag
    #[serde(rename = "type")]
    #[schema(example = "Sector")]
    pub tag_type: String,
    /// Number of linked companies (tag listing only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_count: Option<i64>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
}

impl From<TagModel> for TagDto {
    fn from(tag: TagModel) -> Self {
        Self {
            id: tag.id.into(),
            name: tag.name,
            tag_type: tag.tag_type,
            company_count: None,
            created_at: tag.created_at,
        }
    }
}

impl From<TagWithCount> for TagDto {
    fn from(entry: TagWithCount) -> Self {
        Self {
            company_count: Some(entry.company_count),
            ..Self::from(entry.tag)
        }
    }
}

/// Query parameters for listing tags
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TagListQuery {
    /// Only tags of this type
    #[serde(rename = "type")]
    #[param(rename = "type")]
    pub tag_type: Option<String>,
}

/// Request payload for creating a tag
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTagRequest {
    #[schema(example = "Digital")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    #[schema(example = "Sector")]
    pub tag_type: Option<String>,
}

/// Request payload for attaching a tag to a company
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachTagRequest {
    #[serde(default, deserialize_with = "de_optional_record_id")]
    #[schema(value_type = String, example = "42")]
    pub tag_id: Option<RecordId>,
}

/// List tags ordered by type then name
#[utoipa::path(
    get,
    path = "/tags",
    security(("bearer_auth" = [])),
    params(TagListQuery),
    responses(
        (status = 200, description = "Tags with their company counts", body = [TagDto]),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "tags"
)]
pub async fn list_tags(
    State(state): State<AppState>,
    Query(query): Query<TagListQuery>,
) -> Result<Json<Vec<TagDto>>, ApiError> {
    let tags = TagRepository::new(&state.db)
        .list(query.tag_type.as_deref())
        .await?;

    Ok(Json(tags.into_iter().map(TagDto::from).collect()))
}

/// Create a tag
#[utoipa::path(
    post,
    path = "/tags",
    security(("bearer_auth" = [])),
    request_body = CreateTagRequest,
    responses(
        (status = 201, description = "Tag created", body = TagDto),
        (status = 400, description = "Name or type missing", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 409, description = "A tag with this name and type already exists", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "tags"
)]
pub async fn create_tag(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateTagRequest>,
) -> Result<(StatusCode, Json<TagDto>), ApiError> {
    let name = request
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| missing_field("name"))?;
    let tag_type = request
        .tag_type
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| missing_field("type"))?;

    let tag = TagRepository::new(&state.db).create(&name, &tag_type).await?;
    tracing::info!(tag_id = tag.id, name = %tag.name, tag_type = %tag.tag_type, "Created tag");

    Ok((StatusCode::CREATED, Json(tag.into())))
}

/// Delete a tag
#[utoipa::path(
    delete,
    path = "/tags/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Tag id")),
    responses(
        (status = 204, description = "Tag deleted"),
        (status = 400, description = "Invalid id", body = ApiError),
        (status = 404, description = "Tag not found", body = ApiError)
    ),
    tag = "tags"
)]
pub async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    TagRepository::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Attach a tag to a company; attaching an existing link is a no-op
#[utoipa::path(
    post,
    path = "/companies/{id}/tags",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Company id")),
    request_body = AttachTagRequest,
    responses(
        (status = 200, description = "Tags now linked to the company", body = [TagDto]),
        (status = 400, description = "Invalid id or missing tagId", body = ApiError),
        (status = 404, description = "Company or tag not found", body = ApiError)
    ),
    tag = "tags"
)]
pub async fn attach_company_tag(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<AttachTagRequest>,
) -> Result<Json<Vec<TagDto>>, ApiError> {
    let company_id = parse_id(&id)?;
    let tag_id = request.tag_id.ok_or_else(|| missing_field("tagId"))?;

    let txn = state.db.begin().await?;
    CompanyRepository::new(&txn).ensure_exists(company_id).await?;
    let tags = TagRepository::new(&txn);
    tags.attach(company_id, tag_id.get()).await?;
    let linked = tags.tags_for_company(company_id).await?;
    txn.commit().await?;

    Ok(Json(linked.into_iter().map(TagDto::from).collect()))
}

/// Detach a tag from a company
#[utoipa::path(
    delete,
    path = "/companies/{id}/tags/{tag_id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Company id"),
        ("tag_id" = String, Path, description = "Tag id")
    ),
    responses(
        (status = 204, description = "Tag detached"),
        (status = 400, description = "Invalid id", body = ApiError),
        (status = 404, description = "Company not found or tag not linked", body = ApiError)
    ),
    tag = "tags"
)]
pub async fn detach_company_tag(
    State(state): State<AppState>,
    Path((id, tag_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let company_id = parse_id(&id)?;
    let tag_id = parse_id(&tag_id)?;

    CompanyRepository::new(&state.db).ensure_exists(company_id).await?;
    TagRepository::new(&state.db).detach(company_id, tag_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
