//! Review use-case service.
//!
//! # Invariants
//! - A review always points at an existing contribution.
//! - Reviewers are an unordered set reconciled on update.

use super::{ServiceError, ServiceResult};
use crate::model::contributor::Contributor;
use crate::model::review::{Review, ReviewId, ReviewUpsert};
use crate::repo::contribution_repo::{ContributionRepository, SqliteContributionRepository};
use crate::repo::contributor_repo::{ContributorRepository, SqliteContributorRepository};
use crate::repo::links::{
    apply_link_changes, insert_links, reconcile_links, resolve_all, REVIEW_REVIEWERS,
};
use crate::repo::review_repo::{ReviewRepository, SqliteReviewRepository};
use crate::repo::{Page, RepoError};
use log::info;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Review together with its reviewers sorted by id.
pub type ReviewWithReviewers = (Review, Vec<Contributor>);

/// Review service facade over one open connection.
pub struct ReviewService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ReviewService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn create_review(&self, payload: ReviewUpsert) -> ServiceResult<ReviewWithReviewers> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_contribution(&tx, &payload.contribution_id)?;
        let contributor_repo = SqliteContributorRepository::new(&tx);
        let reviewers = resolve_all::<Contributor, _>(&payload.reviewers, "Reviewer", |id| {
            contributor_repo.get_contributor(*id)
        })?;

        let repo = SqliteReviewRepository::new(&tx);
        let id = repo.create_review(&payload.contribution_id, &payload.link, &payload.notes)?;
        insert_links(&tx, &REVIEW_REVIEWERS, &id, &reviewers)?;
        let created = repo.get_review(id)?.ok_or(ServiceError::InconsistentState(
            "created review not found in read-back",
        ))?;
        let reviewers = contributor_repo.list_for_review(id)?;
        tx.commit()?;

        info!(
            "event=review_create module=service status=ok review_id={} contribution_id={} reviewers={}",
            id,
            created.contribution_id,
            reviewers.len()
        );
        Ok((created, reviewers))
    }

    /// Overwrites link, notes and contribution and reconciles reviewers.
    pub fn update_review(
        &self,
        id: ReviewId,
        payload: ReviewUpsert,
    ) -> ServiceResult<ReviewWithReviewers> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let repo = SqliteReviewRepository::new(&tx);
        if repo.get_review(id)?.is_none() {
            return Err(ServiceError::missing("Review"));
        }
        ensure_contribution(&tx, &payload.contribution_id)?;

        let contributor_repo = SqliteContributorRepository::new(&tx);
        let mut reviewers = contributor_repo.list_for_review(id)?;
        let changes = reconcile_links(&mut reviewers, &payload.reviewers, "Reviewer", |rid| {
            contributor_repo.get_contributor(*rid)
        })?;
        apply_link_changes(&tx, &REVIEW_REVIEWERS, &id, &changes)?;

        repo.update_review(id, &payload.contribution_id, &payload.link, &payload.notes)?;
        let updated = repo.get_review(id)?.ok_or(ServiceError::InconsistentState(
            "updated review not found in read-back",
        ))?;
        let reviewers = contributor_repo.list_for_review(id)?;
        tx.commit()?;

        info!(
            "event=review_update module=service status=ok review_id={} reviewers_added={} reviewers_removed={}",
            id,
            changes.added.len(),
            changes.removed.len()
        );
        Ok((updated, reviewers))
    }

    /// Deletes one review; reviewer links cascade.
    pub fn delete_review(&self, id: ReviewId) -> ServiceResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let repo = SqliteReviewRepository::new(&tx);
        if repo.get_review(id)?.is_none() {
            return Err(ServiceError::missing("Review"));
        }
        repo.delete_review(id)?;
        tx.commit()?;

        info!("event=review_delete module=service status=ok review_id={}", id);
        Ok(())
    }

    pub fn get_review(&self, id: ReviewId) -> ServiceResult<ReviewWithReviewers> {
        let review = SqliteReviewRepository::new(self.conn)
            .get_review(id)?
            .ok_or_else(|| ServiceError::from(RepoError::not_found("Review", id)))?;
        let reviewers = SqliteContributorRepository::new(self.conn).list_for_review(id)?;
        Ok((review, reviewers))
    }

    pub fn list_reviews(&self, page: Page) -> ServiceResult<Vec<ReviewWithReviewers>> {
        let reviews = SqliteReviewRepository::new(self.conn).list_reviews(page)?;
        let contributor_repo = SqliteContributorRepository::new(self.conn);
        let mut items = Vec::with_capacity(reviews.len());
        for review in reviews {
            let reviewers = contributor_repo.list_for_review(review.id)?;
            items.push((review, reviewers));
        }
        Ok(items)
    }
}

fn ensure_contribution(conn: &Connection, contribution_id: &str) -> ServiceResult<()> {
    if SqliteContributionRepository::new(conn)
        .get_contribution(contribution_id)?
        .is_none()
    {
        return Err(RepoError::not_found("Contribution", contribution_id).into());
    }
    Ok(())
}
