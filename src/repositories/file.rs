//! # File Repository

use crate::error::RepositoryError;
use crate::models::file::{self, ActiveModel as FileActiveModel, Entity as File, Model as FileModel};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use url::Url;

/// Attributes of a new file attachment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewFile {
    pub company_id: Option<i64>,
    pub name: String,
    pub file_type: Option<String>,
    pub url: String,
}

/// Repository for File database operations
pub struct FileRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> FileRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Newest first
    pub async fn list(&self, company_id: Option<i64>) -> Result<Vec<FileModel>, RepositoryError> {
        let mut query = File::find();
        if let Some(company_id) = company_id {
            query = query.filter(file::Column::CompanyId.eq(company_id));
        }

        Ok(query
            .order_by_desc(file::Column::CreatedAt)
            .order_by_desc(file::Column::Id)
            .all(self.db)
            .await?)
    }

    pub async fn create(&self, new_file: NewFile) -> Result<FileModel, RepositoryError> {
        let name = new_file.name.trim();
        if name.is_empty() {
            return Err(RepositoryError::validation("name", "File name is required"));
        }
        let url = new_file.url.trim();
        if url.is_empty() {
            return Err(RepositoryError::validation("url", "File URL is required"));
        }
        Url::parse(url)
            .map_err(|e| RepositoryError::validation("url", format!("File URL must be absolute: {e}")))?;

        let now = Utc::now();
        let file = FileActiveModel {
            company_id: Set(new_file.company_id),
            name: Set(name.to_string()),
            file_type: Set(new_file.file_type),
            url: Set(url.to_string()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        Ok(file.insert(self.db).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let result = File::delete_by_id(id).exec(self.db).await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::not_found(
                "FILE_NOT_FOUND",
                format!("File {id} not found"),
            ));
        }
        Ok(())
    }
}
