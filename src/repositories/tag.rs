//! # Tag Repository
//!
//! Tags and the company ↔ tag join table.

use std::collections::HashMap;

use crate::error::RepositoryError;
use crate::models::company_tag::{self, ActiveModel as CompanyTagActiveModel, Entity as CompanyTag};
use crate::models::tag::{self, ActiveModel as TagActiveModel, Entity as Tag, Model as TagModel};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

/// A tag together with the number of companies linked to it
#[derive(Debug, Clone, PartialEq)]
pub struct TagWithCount {
    pub tag: TagModel,
    pub company_count: i64,
}

/// Repository for Tag database operations
pub struct TagRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> TagRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// List tags ordered by type then name, optionally restricted to one type
    pub async fn list(&self, tag_type: Option<&str>) -> Result<Vec<TagWithCount>, RepositoryError> {
        let mut query = Tag::find();
        if let Some(tag_type) = tag_type.map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(tag::Column::TagType.eq(tag_type));
        }

        let tags = query
            .order_by_asc(tag::Column::TagType)
            .order_by_asc(tag::Column::Name)
            .all(self.db)
            .await?;

        let counts: HashMap<i64, i64> = CompanyTag::find()
            .select_only()
            .column(company_tag::Column::TagId)
            .column_as(company_tag::Column::Id.count(), "company_count")
            .group_by(company_tag::Column::TagId)
            .into_tuple::<(i64, i64)>()
            .all(self.db)
            .await?
            .into_iter()
            .collect();

        Ok(tags
            .into_iter()
            .map(|tag| TagWithCount {
                company_count: counts.get(&tag.id).copied().unwrap_or(0),
                tag,
            })
            .collect())
    }

    /// Create a tag. A duplicate (name, type) pair surfaces as a unique violation.
    pub async fn create(&self, name: &str, tag_type: &str) -> Result<TagModel, RepositoryError> {
        let name = name.trim();
        let tag_type = tag_type.trim();
        if name.is_empty() {
            return Err(RepositoryError::validation("name", "Tag name is required"));
        }
        if tag_type.is_empty() {
            return Err(RepositoryError::validation("type", "Tag type is required"));
        }

        let now = Utc::now();
        let tag = TagActiveModel {
            name: Set(name.to_string()),
            tag_type: Set(tag_type.to_string()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        Ok(tag.insert(self.db).await?)
    }

    /// Delete a tag; its company links cascade and distributions keep their rows
    pub async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let result = Tag::delete_by_id(id).exec(self.db).await?;
        if result.rows_affected == 0 {
            return Err(tag_not_found(id));
        }
        Ok(())
    }

    /// Fail with `TAG_NOT_FOUND` naming the first id that does not exist
    pub async fn ensure_all_exist(&self, ids: &[i64]) -> Result<(), RepositoryError> {
        if ids.is_empty() {
            return Ok(());
        }

        let found: Vec<i64> = Tag::find()
            .select_only()
            .column(tag::Column::Id)
            .filter(tag::Column::Id.is_in(ids.to_vec()))
            .into_tuple()
            .all(self.db)
            .await?;

        match ids.iter().find(|id| !found.contains(id)) {
            Some(missing) => Err(tag_not_found(*missing)),
            None => Ok(()),
        }
    }

    /// Tags linked to each of the given companies, ordered by type then name
    pub async fn tags_for_companies(
        &self,
        company_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<TagModel>>, RepositoryError> {
        let mut by_company: HashMap<i64, Vec<TagModel>> = HashMap::new();
        if company_ids.is_empty() {
            return Ok(by_company);
        }

        let links = CompanyTag::find()
            .filter(company_tag::Column::CompanyId.is_in(company_ids.to_vec()))
            .find_also_related(Tag)
            .order_by_asc(tag::Column::TagType)
            .order_by_asc(tag::Column::Name)
            .all(self.db)
            .await?;

        for (link, tag) in links {
            if let Some(tag) = tag {
                by_company.entry(link.company_id).or_default().push(tag);
            }
        }

        Ok(by_company)
    }

    /// Tags linked to one company
    pub async fn tags_for_company(&self, company_id: i64) -> Result<Vec<TagModel>, RepositoryError> {
        Ok(self
            .tags_for_companies(&[company_id])
            .await?
            .remove(&company_id)
            .unwrap_or_default())
    }

    /// Member companies of each tag, in link order
    pub async fn members(&self, tag_ids: &[i64]) -> Result<HashMap<i64, Vec<i64>>, RepositoryError> {
        let mut members: HashMap<i64, Vec<i64>> = HashMap::new();
        if tag_ids.is_empty() {
            return Ok(members);
        }

        let links = CompanyTag::find()
            .filter(company_tag::Column::TagId.is_in(tag_ids.to_vec()))
            .order_by_asc(company_tag::Column::Id)
            .all(self.db)
            .await?;

        for link in links {
            members.entry(link.tag_id).or_default().push(link.company_id);
        }

        Ok(members)
    }

    /// Make the company's tag set exactly `tag_ids`
    pub async fn replace_company_tags(&self, company_id: i64, tag_ids: &[i64]) -> Result<(), RepositoryError> {
        self.ensure_all_exist(tag_ids).await?;

        let mut delete = CompanyTag::delete_many().filter(company_tag::Column::CompanyId.eq(company_id));
        if !tag_ids.is_empty() {
            delete = delete.filter(company_tag::Column::TagId.is_not_in(tag_ids.to_vec()));
        }
        delete.exec(self.db).await?;

        for tag_id in tag_ids {
            self.link(company_id, *tag_id).await?;
        }

        Ok(())
    }

    /// Attach one tag to a company. Attaching an existing link is a no-op.
    pub async fn attach(&self, company_id: i64, tag_id: i64) -> Result<(), RepositoryError> {
        self.ensure_all_exist(&[tag_id]).await?;
        self.link(company_id, tag_id).await
    }

    /// Detach one tag from a company
    pub async fn detach(&self, company_id: i64, tag_id: i64) -> Result<(), RepositoryError> {
        let result = CompanyTag::delete_many()
            .filter(company_tag::Column::CompanyId.eq(company_id))
            .filter(company_tag::Column::TagId.eq(tag_id))
            .exec(self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::not_found(
                "TAG_NOT_FOUND",
                format!("Tag {tag_id} is not linked to company {company_id}"),
            ));
        }
        Ok(())
    }

    async fn link(&self, company_id: i64, tag_id: i64) -> Result<(), RepositoryError> {
        let existing = CompanyTag::find()
            .filter(company_tag::Column::CompanyId.eq(company_id))
            .filter(company_tag::Column::TagId.eq(tag_id))
            .one(self.db)
            .await?;
        if existing.is_some() {
            return Ok(());
        }

        CompanyTagActiveModel {
            company_id: Set(company_id),
            tag_id: Set(tag_id),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(self.db)
        .await?;

        Ok(())
    }
}

pub(crate) fn tag_not_found(id: i64) -> RepositoryError {
    RepositoryError::not_found("TAG_NOT_FOUND", format!("Tag {id} not found"))
}
