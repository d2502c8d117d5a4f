//! # Resources API Handlers
//!
//! Resource CRUD plus distribution. Distribution fans a resource out to explicit
//! companies and to every member of the given tags; see [`crate::distribution`].

use std::collections::HashMap;

use crate::distribution::{DistributionRequest, DistributionService};
use crate::error::{ApiError, missing_field};
use crate::ids::{RecordId, de_optional_record_id, de_record_id_list};
use crate::models::resource::Model as ResourceModel;
use crate::models::resource_distribution::Model as DistributionModel;
use crate::repositories::{CompanyRepository, ResourceFields, ResourceRepository};
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, FixedOffset};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::types::{ApiJson, clean_text, de_optional_timestamp, merge, nullable, parse_id};

/// A resource as returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDto {
    #[schema(value_type = String, example = "4")]
    pub id: RecordId,
    #[schema(example = "Apprenticeship guide")]
    pub title: String,
    #[serde(rename = "type")]
    #[schema(example = "Guide")]
    pub resource_type: Option<String>,
    pub description: Option<String>,
    #[schema(example = "https://resources.example.org/apprenticeships")]
    pub link: Option<String>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

impl From<ResourceModel> for ResourceDto {
    fn from(model: ResourceModel) -> Self {
        Self {
            id: model.id.into(),
            title: model.title,
            resource_type: model.resource_type,
            description: model.description,
            link: model.link,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// One record of a resource sent to a company
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DistributionDto {
    #[schema(value_type = String, example = "21")]
    pub id: RecordId,
    #[schema(value_type = String)]
    pub resource_id: RecordId,
    #[schema(value_type = Option<String>)]
    pub company_id: Option<RecordId>,
    /// Recipient company name, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    /// Tag through which the company was reached
    #[schema(value_type = Option<String>)]
    pub tag_id: Option<RecordId>,
    #[schema(value_type = String, format = DateTime)]
    pub sent_date: DateTimeWithTimeZone,
    pub click_count: i32,
}

impl From<DistributionModel> for DistributionDto {
    fn from(model: DistributionModel) -> Self {
        Self {
            id: model.id.into(),
            resource_id: model.resource_id.into(),
            company_id: model.company_id.map(RecordId::from),
            company_name: None,
            tag_id: model.tag_id.map(RecordId::from),
            sent_date: model.sent_date,
            click_count: model.click_count,
        }
    }
}

/// A resource with everything it has been sent to
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDetailDto {
    #[serde(flatten)]
    pub resource: ResourceDto,
    pub distributions: Vec<DistributionDto>,
}

/// Query parameters for listing resources
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ResourceListQuery {
    /// Exact resource type
    #[serde(rename = "type")]
    #[param(rename = "type")]
    pub resource_type: Option<String>,
}

/// Request payload for creating or replacing a resource.
/// On update, omitted fields keep their stored values.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequest {
    pub title: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub resource_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub link: Option<Option<String>>,
}

impl ResourceRequest {
    fn apply_to(self, fields: &mut ResourceFields) {
        merge(&mut fields.title, self.title.map(|title| title.trim().to_string()));
        merge(&mut fields.resource_type, self.resource_type.map(clean_text));
        merge(&mut fields.description, self.description.map(clean_text));
        merge(&mut fields.link, self.link.map(clean_text));
    }
}

/// Request payload for distributing a resource
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DistributeRequest {
    #[serde(default, deserialize_with = "de_optional_record_id")]
    #[schema(value_type = Option<String>, example = "4")]
    pub resource_id: Option<RecordId>,
    #[serde(default, deserialize_with = "de_record_id_list")]
    #[schema(value_type = Vec<String>)]
    pub company_ids: Vec<RecordId>,
    #[serde(default, deserialize_with = "de_record_id_list")]
    #[schema(value_type = Vec<String>)]
    pub tag_ids: Vec<RecordId>,
    /// Defaults to now
    #[serde(default, deserialize_with = "de_optional_timestamp")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub sent_date: Option<DateTime<FixedOffset>>,
}

/// Result of a distribution
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DistributeResponse {
    /// Number of distribution records created
    pub created: usize,
    pub distributions: Vec<DistributionDto>,
}

/// List resources by title
#[utoipa::path(
    get,
    path = "/resources",
    security(("bearer_auth" = [])),
    params(ResourceListQuery),
    responses(
        (status = 200, description = "Resources", body = [ResourceDto]),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "resources"
)]
pub async fn list_resources(
    State(state): State<AppState>,
    Query(query): Query<ResourceListQuery>,
) -> Result<Json<Vec<ResourceDto>>, ApiError> {
    let resource_type = clean_text(query.resource_type);
    let resources = ResourceRepository::new(&state.db)
        .list(resource_type.as_deref())
        .await?;
    Ok(Json(resources.into_iter().map(ResourceDto::from).collect()))
}

/// Create a resource
#[utoipa::path(
    post,
    path = "/resources",
    security(("bearer_auth" = [])),
    request_body = ResourceRequest,
    responses(
        (status = 201, description = "Resource created", body = ResourceDto),
        (status = 400, description = "Title missing or link not an absolute URL", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "resources"
)]
pub async fn create_resource(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ResourceRequest>,
) -> Result<(StatusCode, Json<ResourceDto>), ApiError> {
    if clean_text(request.title.clone()).is_none() {
        return Err(missing_field("title"));
    }

    let mut fields = ResourceFields::default();
    request.apply_to(&mut fields);
    let resource = ResourceRepository::new(&state.db).create(fields).await?;

    Ok((StatusCode::CREATED, Json(resource.into())))
}

/// Get a resource with its distributions
#[utoipa::path(
    get,
    path = "/resources/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Resource id")),
    responses(
        (status = 200, description = "Resource with distributions", body = ResourceDetailDto),
        (status = 400, description = "Invalid id", body = ApiError),
        (status = 404, description = "Resource not found", body = ApiError)
    ),
    tag = "resources"
)]
pub async fn get_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ResourceDetailDto>, ApiError> {
    let id = parse_id(&id)?;
    let repo = ResourceRepository::new(&state.db);
    let resource = repo.get(id).await?;
    let distributions = repo.distributions(id).await?;

    let mut company_ids: Vec<i64> = distributions.iter().filter_map(|d| d.company_id).collect();
    company_ids.sort_unstable();
    company_ids.dedup();
    let names: HashMap<i64, String> = CompanyRepository::new(&state.db)
        .find_many(&company_ids)
        .await?
        .into_iter()
        .map(|company| (company.id, company.name))
        .collect();

    let distributions = distributions
        .into_iter()
        .map(|model| {
            let company_name = model.company_id.and_then(|cid| names.get(&cid).cloned());
            DistributionDto {
                company_name,
                ..DistributionDto::from(model)
            }
        })
        .collect();

    Ok(Json(ResourceDetailDto {
        resource: resource.into(),
        distributions,
    }))
}

/// Replace a resource; omitted fields keep their stored values
#[utoipa::path(
    put,
    path = "/resources/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Resource id")),
    request_body = ResourceRequest,
    responses(
        (status = 200, description = "Resource updated", body = ResourceDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Resource not found", body = ApiError)
    ),
    tag = "resources"
)]
pub async fn update_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<ResourceRequest>,
) -> Result<Json<ResourceDto>, ApiError> {
    let id = parse_id(&id)?;
    let repo = ResourceRepository::new(&state.db);
    let existing = repo.get(id).await?;

    let mut fields = ResourceFields::from(&existing);
    request.apply_to(&mut fields);
    let resource = repo.update(id, fields).await?;

    Ok(Json(resource.into()))
}

/// Delete a resource and its distributions
#[utoipa::path(
    delete,
    path = "/resources/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Resource id")),
    responses(
        (status = 204, description = "Resource deleted"),
        (status = 400, description = "Invalid id", body = ApiError),
        (status = 404, description = "Resource not found", body = ApiError)
    ),
    tag = "resources"
)]
pub async fn delete_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    ResourceRepository::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Send a resource to companies, directly and through tags
#[utoipa::path(
    post,
    path = "/resources/distribute",
    security(("bearer_auth" = [])),
    request_body = DistributeRequest,
    responses(
        (status = 201, description = "Distribution records created", body = DistributeResponse),
        (status = 400, description = "No recipients given or invalid id", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Resource, company or tag not found", body = ApiError)
    ),
    tag = "resources"
)]
pub async fn distribute_resource(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<DistributeRequest>,
) -> Result<(StatusCode, Json<DistributeResponse>), ApiError> {
    let resource_id = request.resource_id.ok_or_else(|| missing_field("resourceId"))?;

    let outcome = DistributionService::new(&state.db)
        .distribute(DistributionRequest {
            resource_id: resource_id.get(),
            company_ids: request.company_ids.into_iter().map(RecordId::get).collect(),
            tag_ids: request.tag_ids.into_iter().map(RecordId::get).collect(),
            sent_date: request.sent_date,
        })
        .await?;

    let distributions: Vec<DistributionDto> = outcome
        .created
        .into_iter()
        .map(DistributionDto::from)
        .collect();

    Ok((
        StatusCode::CREATED,
        Json(DistributeResponse {
            created: distributions.len(),
            distributions,
        }),
    ))
}

/// Record a click on a distributed resource
#[utoipa::path(
    post,
    path = "/distributions/{id}/click",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Distribution id")),
    responses(
        (status = 200, description = "Updated distribution", body = DistributionDto),
        (status = 400, description = "Invalid id", body = ApiError),
        (status = 404, description = "Distribution not found", body = ApiError)
    ),
    tag = "resources"
)]
pub async fn record_click(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DistributionDto>, ApiError> {
    let id = parse_id(&id)?;
    let distribution = ResourceRepository::new(&state.db).record_click(id).await?;
    Ok(Json(distribution.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn distribute_request_reads_large_ids_exactly() {
        let request: DistributeRequest = serde_json::from_value(json!({
            "resourceId": "4",
            "companyIds": ["1060000000000000001", 2],
            "tagIds": [],
        }))
        .unwrap();

        assert_eq!(request.resource_id, Some(RecordId(4)));
        assert_eq!(
            request.company_ids,
            vec![RecordId(1_060_000_000_000_000_001), RecordId(2)]
        );
        assert!(request.tag_ids.is_empty());
        assert!(request.sent_date.is_none());
    }

    #[test]
    fn resource_update_clears_link_on_null() {
        let mut fields = ResourceFields {
            title: "Guide".into(),
            resource_type: Some("PDF".into()),
            description: Some("Intro".into()),
            link: Some("https://example.org/guide".into()),
        };
        let request: ResourceRequest = serde_json::from_value(json!({ "link": null })).unwrap();
        request.apply_to(&mut fields);

        assert_eq!(fields.title, "Guide");
        assert_eq!(fields.resource_type.as_deref(), Some("PDF"));
        assert!(fields.link.is_none());
    }
}
