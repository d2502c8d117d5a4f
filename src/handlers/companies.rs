//! # Companies API Handlers
//!
//! Company CRUD. Creation and updates write the company row and its tag links
//! in one transaction; the detail view joins tags, engagements (with their
//! follow-ups), activities and files.

use crate::codec::LabelList;
use crate::error::{ApiError, missing_field};
use crate::ids::{RecordId, de_optional_record_id_list};
use crate::models::company::Model as CompanyModel;
use crate::repositories::{
    ActivityRepository, CompanyFields, CompanyFilter, CompanyRepository, EngagementFilter,
    EngagementRepository, FileRepository, TagRepository,
};
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

use super::activities::ActivityDto;
use super::engagements::EngagementDto;
use super::files::FileDto;
use super::tags::TagDto;
use super::types::{ApiJson, clean_text, de_nullable_date, merge, nullable, parse_id, parse_optional_id};

/// A company as returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDto {
    #[schema(value_type = String, example = "1060000000000000001")]
    pub id: RecordId,
    #[schema(example = "Acme Engineering")]
    pub name: String,
    pub sector: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub engagement_status: Option<String>,
    pub first_engagement_date: Option<NaiveDate>,
    pub last_engagement_date: Option<NaiveDate>,
    #[schema(value_type = Vec<String>)]
    pub signup_categories: LabelList,
    pub tags: Vec<TagDto>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

impl CompanyDto {
    pub fn from_model(company: CompanyModel, tags: Vec<TagDto>) -> Self {
        Self {
            id: company.id.into(),
            signup_categories: LabelList::from_column(&company.signup_categories),
            name: company.name,
            sector: company.sector,
            location: company.location,
            website: company.website,
            contact_name: company.contact_name,
            contact_email: company.contact_email,
            contact_phone: company.contact_phone,
            address: company.address,
            notes: company.notes,
            engagement_status: company.engagement_status,
            first_engagement_date: company.first_engagement_date,
            last_engagement_date: company.last_engagement_date,
            tags,
            created_at: company.created_at,
            updated_at: company.updated_at,
        }
    }
}

/// A company with everything attached to it
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDetailDto {
    #[serde(flatten)]
    pub company: CompanyDto,
    pub engagements: Vec<EngagementDto>,
    pub activities: Vec<ActivityDto>,
    pub files: Vec<FileDto>,
}

/// Query parameters for listing companies
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CompanyListQuery {
    /// Case-insensitive substring of the company name
    pub search: Option<String>,
    /// Only companies carrying this tag
    pub tag_id: Option<String>,
    /// Exact sector match
    pub sector: Option<String>,
}

/// Request payload for creating or replacing a company.
///
/// On update, omitted fields keep their stored values and `null` clears them.
/// `tagIds`, when present, replaces the company's tag set.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRequest {
    #[schema(example = "Acme Engineering")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub sector: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub website: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub contact_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub contact_email: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub contact_phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub engagement_status: Option<Option<String>>,
    #[serde(default, deserialize_with = "de_nullable_date")]
    #[schema(value_type = Option<String>, format = Date)]
    pub first_engagement_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "de_nullable_date")]
    #[schema(value_type = Option<String>, format = Date)]
    pub last_engagement_date: Option<Option<NaiveDate>>,
    #[serde(default)]
    #[schema(value_type = Option<Vec<String>>)]
    pub signup_categories: Option<LabelList>,
    #[serde(default, deserialize_with = "de_optional_record_id_list")]
    #[schema(value_type = Option<Vec<String>>)]
    pub tag_ids: Option<Vec<RecordId>>,
}

impl CompanyRequest {
    /// Overlay the supplied fields onto `fields`, returning the requested tag set
    fn apply_to(self, fields: &mut CompanyFields) -> Option<Vec<i64>> {
        merge(&mut fields.name, self.name);
        merge(&mut fields.sector, self.sector.map(clean_text));
        merge(&mut fields.location, self.location.map(clean_text));
        merge(&mut fields.website, self.website.map(clean_text));
        merge(&mut fields.contact_name, self.contact_name.map(clean_text));
        merge(&mut fields.contact_email, self.contact_email.map(clean_text));
        merge(&mut fields.contact_phone, self.contact_phone.map(clean_text));
        merge(&mut fields.address, self.address.map(clean_text));
        merge(&mut fields.notes, self.notes.map(clean_text));
        merge(&mut fields.engagement_status, self.engagement_status.map(clean_text));
        merge(&mut fields.first_engagement_date, self.first_engagement_date);
        merge(&mut fields.last_engagement_date, self.last_engagement_date);
        merge(
            &mut fields.signup_categories,
            self.signup_categories.map(LabelList::into_inner),
        );

        self.tag_ids
            .map(|ids| ids.into_iter().map(RecordId::get).collect())
    }
}

/// List companies ordered by name, each with its tags
#[utoipa::path(
    get,
    path = "/companies",
    security(("bearer_auth" = [])),
    params(CompanyListQuery),
    responses(
        (status = 200, description = "Companies", body = [CompanyDto]),
        (status = 400, description = "Invalid tagId", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "companies"
)]
pub async fn list_companies(
    State(state): State<AppState>,
    Query(query): Query<CompanyListQuery>,
) -> Result<Json<Vec<CompanyDto>>, ApiError> {
    let filter = CompanyFilter {
        search: query.search,
        tag_id: parse_optional_id(query.tag_id.as_deref())?,
        sector: query.sector,
    };

    let companies = CompanyRepository::new(&state.db).list(&filter).await?;
    let ids: Vec<i64> = companies.iter().map(|c| c.id).collect();
    let mut tags = TagRepository::new(&state.db).tags_for_companies(&ids).await?;

    let items = companies
        .into_iter()
        .map(|company| {
            let company_tags = tags.remove(&company.id).unwrap_or_default();
            CompanyDto::from_model(company, company_tags.into_iter().map(TagDto::from).collect())
        })
        .collect();

    Ok(Json(items))
}

/// Create a company together with its tag links
#[utoipa::path(
    post,
    path = "/companies",
    security(("bearer_auth" = [])),
    request_body = CompanyRequest,
    responses(
        (status = 201, description = "Company created", body = CompanyDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "A tag id does not exist", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "companies"
)]
pub async fn create_company(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CompanyRequest>,
) -> Result<(StatusCode, Json<CompanyDto>), ApiError> {
    if request.name.as_deref().is_none_or(|name| name.trim().is_empty()) {
        return Err(missing_field("name"));
    }

    let mut fields = CompanyFields::default();
    let tag_ids = request.apply_to(&mut fields).unwrap_or_default();

    let txn = state.db.begin().await?;
    let company = CompanyRepository::new(&txn).create(fields).await?;
    let tags = TagRepository::new(&txn);
    tags.replace_company_tags(company.id, &tag_ids).await?;
    let linked = tags.tags_for_company(company.id).await?;
    txn.commit().await?;

    tracing::info!(company_id = company.id, tags = linked.len(), "Created company");

    Ok((
        StatusCode::CREATED,
        Json(CompanyDto::from_model(
            company,
            linked.into_iter().map(TagDto::from).collect(),
        )),
    ))
}

/// Get a company with its tags, engagements, activities and files
#[utoipa::path(
    get,
    path = "/companies/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Company id")),
    responses(
        (status = 200, description = "Company detail", body = CompanyDetailDto),
        (status = 400, description = "Invalid id", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Company not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "companies"
)]
pub async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CompanyDetailDto>, ApiError> {
    let id = parse_id(&id)?;
    let company = CompanyRepository::new(&state.db).get(id).await?;

    let tags = TagRepository::new(&state.db).tags_for_company(id).await?;

    let engagement_repo = EngagementRepository::new(&state.db);
    let engagements = engagement_repo
        .list(&EngagementFilter {
            company_id: Some(id),
            status: None,
        })
        .await?;
    let engagement_ids: Vec<i64> = engagements.iter().map(|e| e.id).collect();
    let mut follow_ups = engagement_repo.follow_ups_for(&engagement_ids).await?;

    let activities = ActivityRepository::new(&state.db).list(Some(id)).await?;
    let files = FileRepository::new(&state.db).list(Some(id)).await?;

    let engagements = engagements
        .into_iter()
        .map(|engagement| {
            let actions = follow_ups.remove(&engagement.id).unwrap_or_default();
            EngagementDto::from_parts(engagement, Some(company.name.clone()), actions)
        })
        .collect();

    Ok(Json(CompanyDetailDto {
        company: CompanyDto::from_model(company, tags.into_iter().map(TagDto::from).collect()),
        engagements,
        activities: activities.into_iter().map(ActivityDto::from).collect(),
        files: files.into_iter().map(FileDto::from).collect(),
    }))
}

/// Replace a company; omitted fields keep their stored values
#[utoipa::path(
    put,
    path = "/companies/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Company id")),
    request_body = CompanyRequest,
    responses(
        (status = 200, description = "Company updated", body = CompanyDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Company or tag not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "companies"
)]
pub async fn update_company(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<CompanyRequest>,
) -> Result<Json<CompanyDto>, ApiError> {
    let id = parse_id(&id)?;

    let txn = state.db.begin().await?;
    let companies = CompanyRepository::new(&txn);
    let existing = companies.get(id).await?;

    let mut fields = CompanyFields::from(&existing);
    let tag_ids = request.apply_to(&mut fields);
    let company = companies.update(id, fields).await?;

    let tags = TagRepository::new(&txn);
    if let Some(tag_ids) = tag_ids {
        tags.replace_company_tags(id, &tag_ids).await?;
    }
    let linked = tags.tags_for_company(id).await?;
    txn.commit().await?;

    Ok(Json(CompanyDto::from_model(
        company,
        linked.into_iter().map(TagDto::from).collect(),
    )))
}

/// Delete a company; its engagements, activities, files and tag links cascade
#[utoipa::path(
    delete,
    path = "/companies/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Company id")),
    responses(
        (status = 204, description = "Company deleted"),
        (status = 400, description = "Invalid id", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Company not found", body = ApiError)
    ),
    tag = "companies"
)]
pub async fn delete_company(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    CompanyRepository::new(&state.db).delete(id).await?;
    tracing::info!(company_id = id, "Deleted company");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_keeps_omitted_fields_and_clears_nulls() {
        let mut fields = CompanyFields {
            name: "Acme".to_string(),
            sector: Some("Engineering".to_string()),
            notes: Some("Met at fair".to_string()),
            signup_categories: vec!["Mentoring".to_string()],
            ..Default::default()
        };

        let request: CompanyRequest =
            serde_json::from_str(r#"{"notes": null, "location": "  Leeds "}"#).unwrap();
        let tag_ids = request.apply_to(&mut fields);

        assert_eq!(fields.name, "Acme");
        assert_eq!(fields.sector.as_deref(), Some("Engineering"));
        assert_eq!(fields.notes, None);
        assert_eq!(fields.location.as_deref(), Some("Leeds"));
        assert_eq!(fields.signup_categories, vec!["Mentoring".to_string()]);
        assert_eq!(tag_ids, None);
    }

    #[test]
    fn tag_ids_accept_mixed_encodings() {
        let request: CompanyRequest =
            serde_json::from_str(r#"{"name": "Acme", "tagIds": [1, "1060000000000000001", null]}"#)
                .unwrap();
        let tag_ids = request.apply_to(&mut CompanyFields::default());

        assert_eq!(tag_ids, Some(vec![1, 1_060_000_000_000_000_001]));
    }

    #[test]
    fn signup_categories_accept_encoded_text() {
        let request: CompanyRequest =
            serde_json::from_str(r#"{"signupCategories": "[\"Careers\",\"Work experience\"]"}"#)
                .unwrap();
        let mut fields = CompanyFields::default();
        request.apply_to(&mut fields);

        assert_eq!(fields.signup_categories, vec!["Careers", "Work experience"]);
    }
}
