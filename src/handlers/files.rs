//! # Files API Handlers

use crate::error::{ApiError, missing_field};
use crate::ids::{RecordId, de_optional_record_id};
use crate::models::file::Model as FileModel;
use crate::repositories::{CompanyRepository, FileRepository, NewFile};
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::types::{ApiJson, clean_text, parse_id, parse_optional_id};

/// A file attachment as returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileDto {
    #[schema(value_type = String, example = "3")]
    pub id: RecordId,
    #[schema(value_type = Option<String>)]
    pub company_id: Option<RecordId>,
    #[schema(example = "Partnership agreement.pdf")]
    pub name: String,
    #[serde(rename = "type")]
    #[schema(example = "pdf")]
    pub file_type: Option<String>,
    #[schema(example = "https://files.example.org/agreement.pdf")]
    pub url: String,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
}

impl From<FileModel> for FileDto {
    fn from(model: FileModel) -> Self {
        Self {
            id: model.id.into(),
            company_id: model.company_id.map(RecordId::from),
            name: model.name,
            file_type: model.file_type,
            url: model.url,
            created_at: model.created_at,
        }
    }
}

/// Query parameters for listing files
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FileListQuery {
    /// Only files attached to this company
    pub company_id: Option<String>,
}

/// Request payload for registering a file
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFileRequest {
    #[serde(default, deserialize_with = "de_optional_record_id")]
    #[schema(value_type = Option<String>)]
    pub company_id: Option<RecordId>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub file_type: Option<String>,
    pub url: Option<String>,
}

/// List files, newest first
#[utoipa::path(
    get,
    path = "/files",
    security(("bearer_auth" = [])),
    params(FileListQuery),
    responses(
        (status = 200, description = "Files", body = [FileDto]),
        (status = 400, description = "Invalid companyId", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "files"
)]
pub async fn list_files(
    State(state): State<AppState>,
    Query(query): Query<FileListQuery>,
) -> Result<Json<Vec<FileDto>>, ApiError> {
    let company_id = parse_optional_id(query.company_id.as_deref())?;
    let files = FileRepository::new(&state.db).list(company_id).await?;
    Ok(Json(files.into_iter().map(FileDto::from).collect()))
}

/// Register a file, optionally attached to a company
#[utoipa::path(
    post,
    path = "/files",
    security(("bearer_auth" = [])),
    request_body = CreateFileRequest,
    responses(
        (status = 201, description = "File registered", body = FileDto),
        (status = 400, description = "Name or url missing, or url not absolute", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Company not found", body = ApiError)
    ),
    tag = "files"
)]
pub async fn create_file(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateFileRequest>,
) -> Result<(StatusCode, Json<FileDto>), ApiError> {
    let name = clean_text(request.name).ok_or_else(|| missing_field("name"))?;
    let url = clean_text(request.url).ok_or_else(|| missing_field("url"))?;
    let company_id = request.company_id.map(RecordId::get);

    if let Some(company_id) = company_id {
        CompanyRepository::new(&state.db).ensure_exists(company_id).await?;
    }

    let file = FileRepository::new(&state.db)
        .create(NewFile {
            company_id,
            name,
            file_type: clean_text(request.file_type),
            url,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(file.into())))
}

/// Delete a file record
#[utoipa::path(
    delete,
    path = "/files/{id}",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "File id")),
    responses(
        (status = 204, description = "File deleted"),
        (status = 400, description = "Invalid id", body = ApiError),
        (status = 404, description = "File not found", body = ApiError)
    ),
    tag = "files"
)]
pub async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    FileRepository::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
