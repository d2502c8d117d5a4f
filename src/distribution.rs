//! # Resource Distribution
//!
//! Fans a resource out to companies named directly and to every member of the
//! named tags, producing at most one distribution per (resource, company).
//!
//! [`plan_distribution`] is the pure planning step; [`DistributionService`]
//! resolves tag membership, drops recipients that already hold the resource and
//! inserts the remainder in one transaction.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{debug, info};

use crate::error::RepositoryError;
use crate::models::resource_distribution::Model as DistributionModel;
use crate::repositories::company::company_not_found;
use crate::repositories::{CompanyRepository, NewDistribution, ResourceRepository, TagRepository};

/// One planned distribution row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistributionPlan {
    pub resource_id: i64,
    pub company_id: i64,
    /// Tag through which the company was reached, if any
    pub tag_id: Option<i64>,
}

/// Build the working set of distribution rows.
///
/// Explicit companies come first in input order with duplicates collapsed, then
/// the members of each tag in tag order. A company already in the set is not
/// added again; if it was reached without a tag so far it takes the current one.
pub fn plan_distribution(
    resource_id: i64,
    company_ids: &[i64],
    tag_members: &[(i64, Vec<i64>)],
) -> Vec<DistributionPlan> {
    let mut plans: Vec<DistributionPlan> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();

    for &company_id in company_ids {
        if index.contains_key(&company_id) {
            continue;
        }
        index.insert(company_id, plans.len());
        plans.push(DistributionPlan {
            resource_id,
            company_id,
            tag_id: None,
        });
    }

    for (tag_id, members) in tag_members {
        for &company_id in members {
            match index.get(&company_id) {
                Some(&position) => {
                    let plan = &mut plans[position];
                    if plan.tag_id.is_none() {
                        plan.tag_id = Some(*tag_id);
                    }
                }
                None => {
                    index.insert(company_id, plans.len());
                    plans.push(DistributionPlan {
                        resource_id,
                        company_id,
                        tag_id: Some(*tag_id),
                    });
                }
            }
        }
    }

    plans
}

/// A request to distribute one resource
#[derive(Debug, Clone, Default)]
pub struct DistributionRequest {
    pub resource_id: i64,
    pub company_ids: Vec<i64>,
    pub tag_ids: Vec<i64>,
    /// Defaults to now
    pub sent_date: Option<DateTimeWithTimeZone>,
}

/// Result of a distribution run
#[derive(Debug, Clone, Default)]
pub struct DistributionOutcome {
    /// Rows inserted by this run, in plan order
    pub created: Vec<DistributionModel>,
    /// Recipients skipped because they already held the resource
    pub already_sent: usize,
}

/// Runs distribution requests against the database
pub struct DistributionService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> DistributionService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn distribute(
        &self,
        request: DistributionRequest,
    ) -> Result<DistributionOutcome, RepositoryError> {
        if request.company_ids.is_empty() && request.tag_ids.is_empty() {
            return Err(RepositoryError::validation(
                "companyIds",
                "At least one company or tag is required",
            ));
        }

        let txn = self.db.begin().await?;

        let resources = ResourceRepository::new(&txn);
        resources.get(request.resource_id).await?;

        let found = CompanyRepository::new(&txn)
            .find_many(&request.company_ids)
            .await?;
        if let Some(missing) = request
            .company_ids
            .iter()
            .find(|id| !found.iter().any(|company| company.id == **id))
        {
            return Err(company_not_found(*missing));
        }

        let tags = TagRepository::new(&txn);
        tags.ensure_all_exist(&request.tag_ids).await?;
        let mut members = tags.members(&request.tag_ids).await?;
        let mut tag_members = Vec::with_capacity(request.tag_ids.len());
        for tag_id in &request.tag_ids {
            if let Some(companies) = members.remove(tag_id) {
                tag_members.push((*tag_id, companies));
            }
        }

        let plans = plan_distribution(request.resource_id, &request.company_ids, &tag_members);
        let existing = resources.recipient_ids(request.resource_id).await?;
        let planned = plans.len();

        let sent_date = request.sent_date.unwrap_or_else(|| Utc::now().into());
        let rows: Vec<NewDistribution> = plans
            .into_iter()
            .filter(|plan| !existing.contains(&plan.company_id))
            .map(|plan| NewDistribution {
                resource_id: plan.resource_id,
                company_id: plan.company_id,
                tag_id: plan.tag_id,
                sent_date,
            })
            .collect();
        let already_sent = planned - rows.len();

        let created = resources.insert_distributions(rows).await?;
        txn.commit().await?;

        metrics::counter!("resource_distributions_created_total").increment(created.len() as u64);
        if already_sent > 0 {
            debug!(
                resource_id = request.resource_id,
                already_sent, "Skipped recipients that already hold the resource"
            );
        }
        info!(
            resource_id = request.resource_id,
            created = created.len(),
            "Distributed resource"
        );

        Ok(DistributionOutcome {
            created,
            already_sent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipients(plans: &[DistributionPlan]) -> Vec<(i64, Option<i64>)> {
        plans.iter().map(|p| (p.company_id, p.tag_id)).collect()
    }

    #[test]
    fn tag_members_merge_with_explicit_companies() {
        let plans = plan_distribution(7, &[1, 2], &[(10, vec![2, 3])]);

        assert_eq!(recipients(&plans), vec![(1, None), (2, Some(10)), (3, Some(10))]);
        assert!(plans.iter().all(|p| p.resource_id == 7));
    }

    #[test]
    fn duplicate_explicit_ids_collapse() {
        let plans = plan_distribution(1, &[4, 4, 5, 4], &[]);
        assert_eq!(recipients(&plans), vec![(4, None), (5, None)]);
    }

    #[test]
    fn first_tag_wins_for_shared_members() {
        let plans = plan_distribution(1, &[], &[(10, vec![1, 2]), (11, vec![2, 3])]);
        assert_eq!(
            recipients(&plans),
            vec![(1, Some(10)), (2, Some(10)), (3, Some(11))]
        );
    }

    #[test]
    fn empty_tag_contributes_nothing() {
        let plans = plan_distribution(1, &[9], &[(10, vec![])]);
        assert_eq!(recipients(&plans), vec![(9, None)]);
    }

    #[test]
    fn large_ids_are_kept_exactly() {
        let big = 1_060_000_000_000_000_001;
        let plans = plan_distribution(big, &[big + 1], &[]);
        assert_eq!(plans[0].resource_id, big);
        assert_eq!(plans[0].company_id, big + 1);
    }
}
