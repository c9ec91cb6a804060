//! Contributor use-case service.
//!
//! # Responsibility
//! - Normalize contributor payloads and enforce the naming rules in
//!   [`super::integrity::check_contributor`] before any write.
//! - Answer contributor reads used by the HTTP layer.
//!
//! # Invariants
//! - Update is a full replacement of every contributor field.
//! - Integrity checks and the write share one `IMMEDIATE` transaction.

use super::integrity::check_contributor;
use super::{ServiceError, ServiceResult};
use crate::model::contribution::Contribution;
use crate::model::contributor::{Contributor, ContributorId, ContributorUpsert};
use crate::repo::contribution_repo::{ContributionRepository, SqliteContributionRepository};
use crate::repo::contributor_repo::{ContributorRepository, SqliteContributorRepository};
use crate::repo::review_repo::{ReviewRepository, SqliteReviewRepository};
use crate::repo::Page;
use log::info;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Contributor service facade over one open connection.
pub struct ContributorService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ContributorService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Creates one contributor after normalization and integrity checks.
    pub fn create_contributor(&self, payload: ContributorUpsert) -> ServiceResult<Contributor> {
        let payload = payload.normalize()?;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        check_contributor(&tx, &payload, None)?;

        let repo = SqliteContributorRepository::new(&tx);
        let id = repo.create_contributor(&payload)?;
        let created = repo
            .get_contributor(id)?
            .ok_or(ServiceError::InconsistentState(
                "created contributor not found in read-back",
            ))?;
        tx.commit()?;

        info!(
            "event=contributor_create module=service status=ok contributor_id={}",
            created.id
        );
        Ok(created)
    }

    /// Replaces every field of an existing contributor.
    pub fn update_contributor(
        &self,
        id: ContributorId,
        payload: ContributorUpsert,
    ) -> ServiceResult<Contributor> {
        let payload = payload.normalize()?;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let repo = SqliteContributorRepository::new(&tx);
        if repo.get_contributor(id)?.is_none() {
            return Err(ServiceError::missing("Contributor"));
        }
        check_contributor(&tx, &payload, Some(id))?;

        repo.update_contributor(id, &payload)?;
        let updated = repo
            .get_contributor(id)?
            .ok_or(ServiceError::InconsistentState(
                "updated contributor not found in read-back",
            ))?;
        tx.commit()?;

        info!(
            "event=contributor_update module=service status=ok contributor_id={}",
            id
        );
        Ok(updated)
    }

    pub fn get_contributor(&self, id: ContributorId) -> ServiceResult<Contributor> {
        SqliteContributorRepository::new(self.conn)
            .get_contributor(id)?
            .ok_or_else(|| ServiceError::missing("Contributor"))
    }

    pub fn get_by_local_handle(&self, local_handle: &str) -> ServiceResult<Contributor> {
        SqliteContributorRepository::new(self.conn)
            .find_by_local_handle(local_handle)?
            .ok_or_else(|| ServiceError::missing("Contributor"))
    }

    pub fn list_contributors(&self, page: Page) -> ServiceResult<Vec<Contributor>> {
        Ok(SqliteContributorRepository::new(self.conn).list_contributors(page)?)
    }

    /// Contributions of every review that lists `id` among its reviewers.
    ///
    /// Each contribution appears once even when reviewed several times.
    pub fn reviewed_contributions(&self, id: ContributorId) -> ServiceResult<Vec<Contribution>> {
        let reviews = SqliteReviewRepository::new(self.conn).list_by_reviewer(id)?;
        let mut contribution_ids = Vec::with_capacity(reviews.len());
        for review in reviews {
            if !contribution_ids.contains(&review.contribution_id) {
                contribution_ids.push(review.contribution_id);
            }
        }
        Ok(SqliteContributionRepository::new(self.conn).list_by_ids(&contribution_ids)?)
    }
}
