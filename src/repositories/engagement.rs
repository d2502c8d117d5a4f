//! # Engagement Repository
//!
//! Engagements and their nested follow-up actions. Multi-row writes expect to
//! be handed an open transaction by the caller.

use std::collections::HashMap;

use crate::codec;
use crate::error::RepositoryError;
use crate::models::engagement::{
    self, ActiveModel as EngagementActiveModel, Entity as Engagement, Model as EngagementModel,
};
use crate::models::follow_up_action::{
    self, ActiveModel as FollowUpActiveModel, Entity as FollowUpAction, Model as FollowUpModel,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

/// Every writable engagement attribute
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngagementFields {
    pub company_id: i64,
    pub date_of_contact: Option<NaiveDate>,
    pub engagement_type: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub outcome: Option<String>,
    pub resources_sent: Vec<String>,
}

impl From<&EngagementModel> for EngagementFields {
    fn from(model: &EngagementModel) -> Self {
        Self {
            company_id: model.company_id,
            date_of_contact: model.date_of_contact,
            engagement_type: model.engagement_type.clone(),
            status: model.status.clone(),
            notes: model.notes.clone(),
            outcome: model.outcome.clone(),
            resources_sent: codec::decode(Some(&model.resources_sent)),
        }
    }
}

/// A follow-up action as submitted with an engagement.
/// `id` identifies an existing row to update; `None` inserts a new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FollowUpFields {
    pub id: Option<i64>,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
}

/// Filters accepted by [`EngagementRepository::list`]
#[derive(Debug, Clone, Default)]
pub struct EngagementFilter {
    pub company_id: Option<i64>,
    pub status: Option<String>,
}

/// Filters accepted by [`EngagementRepository::list_follow_ups`]
#[derive(Debug, Clone, Default)]
pub struct FollowUpFilter {
    pub completed: Option<bool>,
    /// Only actions due strictly before this date
    pub due_before: Option<NaiveDate>,
}

/// Repository for Engagement and FollowUpAction database operations
pub struct EngagementRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> EngagementRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Most recent contact first
    pub async fn list(&self, filter: &EngagementFilter) -> Result<Vec<EngagementModel>, RepositoryError> {
        let mut query = Engagement::find();
        if let Some(company_id) = filter.company_id {
            query = query.filter(engagement::Column::CompanyId.eq(company_id));
        }
        if let Some(status) = filter.status.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(engagement::Column::Status.eq(status));
        }

        Ok(query
            .order_by_desc(engagement::Column::DateOfContact)
            .order_by_desc(engagement::Column::Id)
            .all(self.db)
            .await?)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<EngagementModel>, RepositoryError> {
        Ok(Engagement::find_by_id(id).one(self.db).await?)
    }

    /// Get engagement by ID, failing with `ENGAGEMENT_NOT_FOUND`
    pub async fn get(&self, id: i64) -> Result<EngagementModel, RepositoryError> {
        self.find_by_id(id).await?.ok_or_else(|| {
            RepositoryError::not_found("ENGAGEMENT_NOT_FOUND", format!("Engagement {id} not found"))
        })
    }

    pub async fn create(&self, fields: EngagementFields) -> Result<EngagementModel, RepositoryError> {
        let now = Utc::now();
        let mut engagement = EngagementActiveModel {
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        apply_fields(&mut engagement, fields);

        Ok(engagement.insert(self.db).await?)
    }

    pub async fn update(&self, id: i64, fields: EngagementFields) -> Result<EngagementModel, RepositoryError> {
        let mut engagement = self.get(id).await?.into_active_model();
        apply_fields(&mut engagement, fields);
        engagement.updated_at = Set(Utc::now().into());

        Ok(engagement.update(self.db).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let result = Engagement::delete_by_id(id).exec(self.db).await?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::not_found(
                "ENGAGEMENT_NOT_FOUND",
                format!("Engagement {id} not found"),
            ));
        }
        Ok(())
    }

    /// Newest engagements by creation time
    pub async fn recent(&self, limit: u64) -> Result<Vec<EngagementModel>, RepositoryError> {
        Ok(Engagement::find()
            .order_by_desc(engagement::Column::CreatedAt)
            .order_by_desc(engagement::Column::Id)
            .limit(limit)
            .all(self.db)
            .await?)
    }

    /// Insert follow-up actions for a freshly created engagement
    pub async fn add_follow_ups(
        &self,
        engagement_id: i64,
        follow_ups: Vec<FollowUpFields>,
    ) -> Result<Vec<FollowUpModel>, RepositoryError> {
        let mut created = Vec::with_capacity(follow_ups.len());
        for fields in follow_ups {
            created.push(self.insert_follow_up(engagement_id, fields).await?);
        }
        Ok(created)
    }

    /// Make the engagement's follow-ups exactly `follow_ups`: rows with an id are
    /// updated, rows without are inserted, stored rows not mentioned are deleted.
    pub async fn replace_follow_ups(
        &self,
        engagement_id: i64,
        follow_ups: Vec<FollowUpFields>,
    ) -> Result<Vec<FollowUpModel>, RepositoryError> {
        let keep: Vec<i64> = follow_ups.iter().filter_map(|f| f.id).collect();

        let mut stale = FollowUpAction::delete_many()
            .filter(follow_up_action::Column::EngagementId.eq(engagement_id));
        if !keep.is_empty() {
            stale = stale.filter(follow_up_action::Column::Id.is_not_in(keep));
        }
        stale.exec(self.db).await?;

        let mut result = Vec::with_capacity(follow_ups.len());
        for fields in follow_ups {
            let model = match fields.id {
                Some(id) => {
                    let existing = FollowUpAction::find_by_id(id)
                        .filter(follow_up_action::Column::EngagementId.eq(engagement_id))
                        .one(self.db)
                        .await?
                        .ok_or_else(|| follow_up_not_found(id))?;
                    let mut active = existing.into_active_model();
                    apply_follow_up(&mut active, fields)?;
                    active.updated_at = Set(Utc::now().into());
                    active.update(self.db).await?
                }
                None => self.insert_follow_up(engagement_id, fields).await?,
            };
            result.push(model);
        }

        Ok(result)
    }

    /// Follow-ups for each engagement, soonest due first
    pub async fn follow_ups_for(
        &self,
        engagement_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<FollowUpModel>>, RepositoryError> {
        let mut grouped: HashMap<i64, Vec<FollowUpModel>> = HashMap::new();
        if engagement_ids.is_empty() {
            return Ok(grouped);
        }

        let rows = FollowUpAction::find()
            .filter(follow_up_action::Column::EngagementId.is_in(engagement_ids.to_vec()))
            .order_by_asc(follow_up_action::Column::DueDate)
            .order_by_asc(follow_up_action::Column::Id)
            .all(self.db)
            .await?;

        for row in rows {
            grouped.entry(row.engagement_id).or_default().push(row);
        }
        Ok(grouped)
    }

    /// Follow-ups across all engagements, soonest due first
    pub async fn list_follow_ups(&self, filter: &FollowUpFilter) -> Result<Vec<FollowUpModel>, RepositoryError> {
        let mut query = FollowUpAction::find();
        if let Some(completed) = filter.completed {
            query = query.filter(follow_up_action::Column::Completed.eq(completed));
        }
        if let Some(due_before) = filter.due_before {
            query = query.filter(follow_up_action::Column::DueDate.lt(due_before));
        }

        Ok(query
            .order_by_asc(follow_up_action::Column::DueDate)
            .order_by_asc(follow_up_action::Column::Id)
            .all(self.db)
            .await?)
    }

    /// Incomplete follow-ups with a due date, soonest first
    pub async fn upcoming_follow_ups(&self, limit: u64) -> Result<Vec<FollowUpModel>, RepositoryError> {
        Ok(FollowUpAction::find()
            .filter(follow_up_action::Column::Completed.eq(false))
            .filter(follow_up_action::Column::DueDate.is_not_null())
            .order_by_asc(follow_up_action::Column::DueDate)
            .order_by_asc(follow_up_action::Column::Id)
            .limit(limit)
            .all(self.db)
            .await?)
    }

    /// Get a follow-up action, failing with `FOLLOW_UP_NOT_FOUND`
    pub async fn get_follow_up(&self, id: i64) -> Result<FollowUpModel, RepositoryError> {
        FollowUpAction::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or_else(|| follow_up_not_found(id))
    }

    /// Replace the attributes of a single follow-up action
    pub async fn update_follow_up(&self, id: i64, fields: FollowUpFields) -> Result<FollowUpModel, RepositoryError> {
        let mut active = self.get_follow_up(id).await?.into_active_model();
        apply_follow_up(&mut active, fields)?;
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(self.db).await?)
    }

    async fn insert_follow_up(
        &self,
        engagement_id: i64,
        fields: FollowUpFields,
    ) -> Result<FollowUpModel, RepositoryError> {
        let now = Utc::now();
        let mut active = FollowUpActiveModel {
            engagement_id: Set(engagement_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        apply_follow_up(&mut active, fields)?;
        Ok(active.insert(self.db).await?)
    }
}

fn follow_up_not_found(id: i64) -> RepositoryError {
    RepositoryError::not_found("FOLLOW_UP_NOT_FOUND", format!("Follow-up action {id} not found"))
}

fn apply_fields(engagement: &mut EngagementActiveModel, fields: EngagementFields) {
    engagement.company_id = Set(fields.company_id);
    engagement.date_of_contact = Set(fields.date_of_contact);
    engagement.engagement_type = Set(fields.engagement_type);
    engagement.status = Set(fields.status);
    engagement.notes = Set(fields.notes);
    engagement.outcome = Set(fields.outcome);
    engagement.resources_sent = Set(codec::encode(&fields.resources_sent));
}

fn apply_follow_up(active: &mut FollowUpActiveModel, fields: FollowUpFields) -> Result<(), RepositoryError> {
    let description = fields.description.trim();
    if description.is_empty() {
        return Err(RepositoryError::validation(
            "followUps.description",
            "Follow-up description is required",
        ));
    }
    active.description = Set(description.to_string());
    active.due_date = Set(fields.due_date);
    active.completed = Set(fields.completed);
    Ok(())
}
