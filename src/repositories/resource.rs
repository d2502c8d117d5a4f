//! # Resource Repository
//!
//! Shareable resources and the records of their distribution to companies.

use crate::error::RepositoryError;
use crate::models::resource::{
    self, ActiveModel as ResourceActiveModel, Entity as Resource, Model as ResourceModel,
};
use crate::models::resource_distribution::{
    self, ActiveModel as DistributionActiveModel, Entity as ResourceDistribution,
    Model as DistributionModel,
};
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use url::Url;

/// Every writable resource attribute
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceFields {
    pub title: String,
    pub resource_type: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
}

impl From<&ResourceModel> for ResourceFields {
    fn from(model: &ResourceModel) -> Self {
        Self {
            title: model.title.clone(),
            resource_type: model.resource_type.clone(),
            description: model.description.clone(),
            link: model.link.clone(),
        }
    }
}

/// One distribution row to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewDistribution {
    pub resource_id: i64,
    pub company_id: i64,
    pub tag_id: Option<i64>,
    pub sent_date: DateTimeWithTimeZone,
}

/// Repository for Resource and ResourceDistribution database operations
pub struct ResourceRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> ResourceRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// List resources ordered by title, optionally restricted to one type
    pub async fn list(&self, resource_type: Option<&str>) -> Result<Vec<ResourceModel>, RepositoryError> {
        let mut query = Resource::find();
        if let Some(resource_type) = resource_type.map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(resource::Column::ResourceType.eq(resource_type));
        }

        Ok(query
            .order_by_asc(resource::Column::Title)
            .order_by_asc(resource::Column::Id)
            .all(self.db)
            .await?)
    }

    /// Get resource by ID, failing with `RESOURCE_NOT_FOUND`
    pub async fn get(&self, id: i64) -> Result<ResourceModel, RepositoryError> {
        Resource::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or_else(|| resource_not_found(id))
    }

    pub async fn create(&self, fields: ResourceFields) -> Result<ResourceModel, RepositoryError> {
        let fields = validate(fields)?;

        let now = Utc::now();
        let mut active = ResourceActiveModel {
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        apply_fields(&mut active, fields);

        Ok(active.insert(self.db).await?)
    }

    pub async fn update(&self, id: i64, fields: ResourceFields) -> Result<ResourceModel, RepositoryError> {
        let fields = validate(fields)?;

        let mut active = self.get(id).await?.into_active_model();
        apply_fields(&mut active, fields);
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(self.db).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let result = Resource::delete_by_id(id).exec(self.db).await?;
        if result.rows_affected == 0 {
            return Err(resource_not_found(id));
        }
        Ok(())
    }

    /// Distributions of one resource, newest first
    pub async fn distributions(&self, resource_id: i64) -> Result<Vec<DistributionModel>, RepositoryError> {
        Ok(ResourceDistribution::find()
            .filter(resource_distribution::Column::ResourceId.eq(resource_id))
            .order_by_desc(resource_distribution::Column::SentDate)
            .order_by_asc(resource_distribution::Column::Id)
            .all(self.db)
            .await?)
    }

    /// Companies that already hold a distribution of the resource
    pub async fn recipient_ids(&self, resource_id: i64) -> Result<Vec<i64>, RepositoryError> {
        let ids: Vec<Option<i64>> = ResourceDistribution::find()
            .select_only()
            .column(resource_distribution::Column::CompanyId)
            .filter(resource_distribution::Column::ResourceId.eq(resource_id))
            .into_tuple()
            .all(self.db)
            .await?;

        Ok(ids.into_iter().flatten().collect())
    }

    /// Insert all rows with one statement and return them in input order
    pub async fn insert_distributions(
        &self,
        rows: Vec<NewDistribution>,
    ) -> Result<Vec<DistributionModel>, RepositoryError> {
        let Some(first) = rows.first() else {
            return Ok(Vec::new());
        };
        let resource_id = first.resource_id;
        let company_ids: Vec<i64> = rows.iter().map(|row| row.company_id).collect();

        let now = Utc::now();
        let models = rows.into_iter().map(|row| DistributionActiveModel {
            resource_id: Set(row.resource_id),
            company_id: Set(Some(row.company_id)),
            tag_id: Set(row.tag_id),
            sent_date: Set(row.sent_date),
            click_count: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        });
        ResourceDistribution::insert_many(models).exec(self.db).await?;

        let mut inserted = ResourceDistribution::find()
            .filter(resource_distribution::Column::ResourceId.eq(resource_id))
            .filter(resource_distribution::Column::CompanyId.is_in(company_ids.clone()))
            .all(self.db)
            .await?;
        inserted.sort_by_key(|row| {
            company_ids
                .iter()
                .position(|id| Some(*id) == row.company_id)
                .unwrap_or(usize::MAX)
        });

        Ok(inserted)
    }

    /// Increment the click counter of a distribution
    pub async fn record_click(&self, distribution_id: i64) -> Result<DistributionModel, RepositoryError> {
        let result = ResourceDistribution::update_many()
            .col_expr(
                resource_distribution::Column::ClickCount,
                Expr::col(resource_distribution::Column::ClickCount).add(1),
            )
            .col_expr(
                resource_distribution::Column::UpdatedAt,
                Expr::value(DateTimeWithTimeZone::from(Utc::now())),
            )
            .filter(resource_distribution::Column::Id.eq(distribution_id))
            .exec(self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(distribution_not_found(distribution_id));
        }

        ResourceDistribution::find_by_id(distribution_id)
            .one(self.db)
            .await?
            .ok_or_else(|| distribution_not_found(distribution_id))
    }

    /// Clicks summed over every distribution
    pub async fn total_clicks(&self) -> Result<i64, RepositoryError> {
        let clicks: Option<Option<i64>> = ResourceDistribution::find()
            .select_only()
            .column_as(Expr::col(resource_distribution::Column::ClickCount).sum(), "clicks")
            .into_tuple()
            .one(self.db)
            .await?;

        Ok(clicks.flatten().unwrap_or_default())
    }
}

pub(crate) fn resource_not_found(id: i64) -> RepositoryError {
    RepositoryError::not_found("RESOURCE_NOT_FOUND", format!("Resource {id} not found"))
}

fn distribution_not_found(id: i64) -> RepositoryError {
    RepositoryError::not_found(
        "DISTRIBUTION_NOT_FOUND",
        format!("Distribution {id} not found"),
    )
}

fn validate(mut fields: ResourceFields) -> Result<ResourceFields, RepositoryError> {
    fields.title = fields.title.trim().to_string();
    if fields.title.is_empty() {
        return Err(RepositoryError::validation("title", "Resource title is required"));
    }

    fields.link = fields
        .link
        .map(|link| link.trim().to_string())
        .filter(|link| !link.is_empty());
    if let Some(link) = fields.link.as_deref() {
        Url::parse(link).map_err(|e| {
            RepositoryError::validation("link", format!("Resource link must be an absolute URL: {e}"))
        })?;
    }

    Ok(fields)
}

fn apply_fields(active: &mut ResourceActiveModel, fields: ResourceFields) {
    active.title = Set(fields.title);
    active.resource_type = Set(fields.resource_type);
    active.description = Set(fields.description);
    active.link = Set(fields.link);
}
