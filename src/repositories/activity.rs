//! # Activity Repository
//!
//! Additional learning activities delivered to companies.

use crate::codec;
use crate::error::RepositoryError;
use crate::models::additional_activity::{
    self, ActiveModel as ActivityActiveModel, Entity as AdditionalActivity, Model as ActivityModel,
};
use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

/// Every writable activity attribute
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityFields {
    pub company_id: i64,
    pub activity_date: Option<NaiveDate>,
    pub activity_type: Option<String>,
    pub tools_delivered: Vec<String>,
    pub work_experience: bool,
    pub careers_talk: bool,
    pub mentoring: bool,
    pub workshop: bool,
    pub learner_count: i32,
    pub monetary_value: f64,
    pub notes: Option<String>,
}

impl From<&ActivityModel> for ActivityFields {
    fn from(model: &ActivityModel) -> Self {
        Self {
            company_id: model.company_id,
            activity_date: model.activity_date,
            activity_type: model.activity_type.clone(),
            tools_delivered: codec::decode(Some(&model.tools_delivered)),
            work_experience: model.work_experience,
            careers_talk: model.careers_talk,
            mentoring: model.mentoring,
            workshop: model.workshop,
            learner_count: model.learner_count,
            monetary_value: model.monetary_value,
            notes: model.notes.clone(),
        }
    }
}

/// Aggregate reach across all activities
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActivityTotals {
    pub learners_reached: i64,
    pub monetary_value: f64,
}

/// Repository for AdditionalActivity database operations
pub struct ActivityRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> ActivityRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Most recent activity first
    pub async fn list(&self, company_id: Option<i64>) -> Result<Vec<ActivityModel>, RepositoryError> {
        let mut query = AdditionalActivity::find();
        if let Some(company_id) = company_id {
            query = query.filter(additional_activity::Column::CompanyId.eq(company_id));
        }

        Ok(query
            .order_by_desc(additional_activity::Column::ActivityDate)
            .order_by_desc(additional_activity::Column::Id)
            .all(self.db)
            .await?)
    }

    /// Get activity by ID, failing with `ACTIVITY_NOT_FOUND`
    pub async fn get(&self, id: i64) -> Result<ActivityModel, RepositoryError> {
        AdditionalActivity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or_else(|| activity_not_found(id))
    }

    pub async fn create(&self, fields: ActivityFields) -> Result<ActivityModel, RepositoryError> {
        validate(&fields)?;

        let now = Utc::now();
        let mut activity = ActivityActiveModel {
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        apply_fields(&mut activity, fields);

        Ok(activity.insert(self.db).await?)
    }

    pub async fn update(&self, id: i64, fields: ActivityFields) -> Result<ActivityModel, RepositoryError> {
        validate(&fields)?;

        let mut activity = self.get(id).await?.into_active_model();
        apply_fields(&mut activity, fields);
        activity.updated_at = Set(Utc::now().into());

        Ok(activity.update(self.db).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let result = AdditionalActivity::delete_by_id(id).exec(self.db).await?;
        if result.rows_affected == 0 {
            return Err(activity_not_found(id));
        }
        Ok(())
    }

    /// Learners reached and monetary value summed over every activity
    pub async fn totals(&self) -> Result<ActivityTotals, RepositoryError> {
        let sums: Option<(Option<i64>, Option<f64>)> = AdditionalActivity::find()
            .select_only()
            .column_as(Expr::col(additional_activity::Column::LearnerCount).sum(), "learners_reached")
            .column_as(Expr::col(additional_activity::Column::MonetaryValue).sum(), "monetary_value")
            .into_tuple()
            .one(self.db)
            .await?;

        let (learners, value) = sums.unwrap_or_default();
        Ok(ActivityTotals {
            learners_reached: learners.unwrap_or_default(),
            monetary_value: value.unwrap_or_default(),
        })
    }
}

fn activity_not_found(id: i64) -> RepositoryError {
    RepositoryError::not_found("ACTIVITY_NOT_FOUND", format!("Activity {id} not found"))
}

fn validate(fields: &ActivityFields) -> Result<(), RepositoryError> {
    if fields.learner_count < 0 {
        return Err(RepositoryError::validation(
            "learnerCount",
            "Learner count cannot be negative",
        ));
    }
    if !fields.monetary_value.is_finite() || fields.monetary_value < 0.0 {
        return Err(RepositoryError::validation(
            "monetaryValue",
            "Monetary value must be a non-negative number",
        ));
    }
    Ok(())
}

fn apply_fields(activity: &mut ActivityActiveModel, fields: ActivityFields) {
    activity.company_id = Set(fields.company_id);
    activity.activity_date = Set(fields.activity_date);
    activity.activity_type = Set(fields.activity_type);
    activity.tools_delivered = Set(codec::encode(&fields.tools_delivered));
    activity.work_experience = Set(fields.work_experience);
    activity.careers_talk = Set(fields.careers_talk);
    activity.mentoring = Set(fields.mentoring);
    activity.workshop = Set(fields.workshop);
    activity.learner_count = Set(fields.learner_count);
    activity.monetary_value = Set(fields.monetary_value);
    activity.notes = Set(fields.notes);
}
