//! # Company Repository
//!
//! CRUD operations for companies. Every method works against any
//! [`ConnectionTrait`], so handlers can pass the pool or an open transaction.

use crate::codec;
use crate::error::RepositoryError;
use crate::models::company::{self, ActiveModel as CompanyActiveModel, Entity as Company, Model as CompanyModel};
use crate::models::company_tag::{self, Entity as CompanyTag};
use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

/// Every writable company attribute. Used for creation and for full-replace updates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyFields {
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
    pub signup_categories: Vec<String>,
}

impl From<&CompanyModel> for CompanyFields {
    fn from(model: &CompanyModel) -> Self {
        Self {
            name: model.name.clone(),
            sector: model.sector.clone(),
            location: model.location.clone(),
            website: model.website.clone(),
            contact_name: model.contact_name.clone(),
            contact_email: model.contact_email.clone(),
            contact_phone: model.contact_phone.clone(),
            address: model.address.clone(),
            notes: model.notes.clone(),
            engagement_status: model.engagement_status.clone(),
            first_engagement_date: model.first_engagement_date,
            last_engagement_date: model.last_engagement_date,
            signup_categories: codec::decode(Some(&model.signup_categories)),
        }
    }
}

/// Filters accepted by [`CompanyRepository::list`]
#[derive(Debug, Clone, Default)]
pub struct CompanyFilter {
    /// Case-insensitive substring of the company name
    pub search: Option<String>,
    /// Only companies linked to this tag
    pub tag_id: Option<i64>,
    /// Exact sector match
    pub sector: Option<String>,
}

/// Repository for Company database operations
pub struct CompanyRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> CompanyRepository<'a, C> {
    /// Create a new CompanyRepository with the given connection
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// List companies ordered by name
    pub async fn list(&self, filter: &CompanyFilter) -> Result<Vec<CompanyModel>, RepositoryError> {
        let mut query = Company::find();

        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = LikeExpr::new(contains_pattern(search)).escape(LIKE_ESCAPE);
            query = query.filter(Expr::expr(Func::lower(Expr::col(company::Column::Name))).like(pattern));
        }

        if let Some(sector) = filter.sector.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(company::Column::Sector.eq(sector));
        }

        if let Some(tag_id) = filter.tag_id {
            let company_ids: Vec<i64> = CompanyTag::find()
                .select_only()
                .column(company_tag::Column::CompanyId)
                .filter(company_tag::Column::TagId.eq(tag_id))
                .into_tuple()
                .all(self.db)
                .await?;
            if company_ids.is_empty() {
                return Ok(Vec::new());
            }
            query = query.filter(company::Column::Id.is_in(company_ids));
        }

        let companies = query
            .order_by_asc(company::Column::Name)
            .order_by_asc(company::Column::Id)
            .all(self.db)
            .await?;

        Ok(companies)
    }

    /// Get company by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<CompanyModel>, RepositoryError> {
        Ok(Company::find_by_id(id).one(self.db).await?)
    }

    /// Get company by ID, failing with `COMPANY_NOT_FOUND`
    pub async fn get(&self, id: i64) -> Result<CompanyModel, RepositoryError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| company_not_found(id))
    }

    /// Fail with `COMPANY_NOT_FOUND` unless the company exists
    pub async fn ensure_exists(&self, id: i64) -> Result<(), RepositoryError> {
        self.get(id).await.map(|_| ())
    }

    /// Fetch several companies at once; missing ids are simply absent from the result
    pub async fn find_many(&self, ids: &[i64]) -> Result<Vec<CompanyModel>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(Company::find()
            .filter(company::Column::Id.is_in(ids.to_vec()))
            .all(self.db)
            .await?)
    }

    /// Create a new company
    pub async fn create(&self, fields: CompanyFields) -> Result<CompanyModel, RepositoryError> {
        validate_name(&fields.name)?;

        let now = Utc::now();
        let mut company = CompanyActiveModel {
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        apply_fields(&mut company, fields);

        Ok(company.insert(self.db).await?)
    }

    /// Replace every attribute of an existing company
    pub async fn update(&self, id: i64, fields: CompanyFields) -> Result<CompanyModel, RepositoryError> {
        validate_name(&fields.name)?;

        let mut company = self.get(id).await?.into_active_model();
        apply_fields(&mut company, fields);
        company.updated_at = Set(Utc::now().into());

        Ok(company.update(self.db).await?)
    }

    /// Delete a company. Engagements, activities, files and tag links go with it.
    pub async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let result = Company::delete_by_id(id).exec(self.db).await?;
        if result.rows_affected == 0 {
            return Err(company_not_found(id));
        }
        Ok(())
    }

    /// Widen the company's engagement window to include `date`
    pub async fn record_engagement_date(&self, id: i64, date: NaiveDate) -> Result<(), RepositoryError> {
        let company = self.get(id).await?;

        let first = company.first_engagement_date.map_or(date, |d| d.min(date));
        let last = company.last_engagement_date.map_or(date, |d| d.max(date));
        if company.first_engagement_date == Some(first) && company.last_engagement_date == Some(last) {
            return Ok(());
        }

        let mut active = company.into_active_model();
        active.first_engagement_date = Set(Some(first));
        active.last_engagement_date = Set(Some(last));
        active.updated_at = Set(Utc::now().into());
        active.update(self.db).await?;

        Ok(())
    }

    /// Newest companies first
    pub async fn recent(&self, limit: u64) -> Result<Vec<CompanyModel>, RepositoryError> {
        Ok(Company::find()
            .order_by_desc(company::Column::CreatedAt)
            .order_by_desc(company::Column::Id)
            .limit(limit)
            .all(self.db)
            .await?)
    }
}

const LIKE_ESCAPE: char = '\\';

/// Case-insensitive substring pattern with `%`, `_` and the escape character taken literally.
fn contains_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for ch in search.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

pub(crate) fn company_not_found(id: i64) -> RepositoryError {
    RepositoryError::not_found("COMPANY_NOT_FOUND", format!("Company {id} not found"))
}

fn validate_name(name: &str) -> Result<(), RepositoryError> {
    if name.trim().is_empty() {
        return Err(RepositoryError::validation("name", "Company name is required"));
    }
    Ok(())
}

fn apply_fields(company: &mut CompanyActiveModel, fields: CompanyFields) {
    company.name = Set(fields.name.trim().to_string());
    company.sector = Set(fields.sector);
    company.location = Set(fields.location);
    company.website = Set(fields.website);
    company.contact_name = Set(fields.contact_name);
    company.contact_email = Set(fields.contact_email);
    company.contact_phone = Set(fields.contact_phone);
    company.address = Set(fields.address);
    company.notes = Set(fields.notes);
    company.engagement_status = Set(fields.engagement_status);
    company.first_engagement_date = Set(fields.first_engagement_date);
    company.last_engagement_date = Set(fields.last_engagement_date);
    company.signup_categories = Set(codec::encode(&fields.signup_categories));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("Acme"), "%acme%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }
}
