//! Contribution use-case service.
//!
//! # Responsibility
//! - Create and update contributions together with their four kinds of
//!   links (ordered contributors, tags, dependencies).
//! - Answer contribution reads and graph traversals.
//!
//! # Invariants
//! - References resolve in the order contributors, tags, dependencies on
//!   create; the first miss aborts with `NotFound` and nothing is written.
//! - Stored contributor order is exactly the last written list order.
//! - Dependency cycles and self-dependencies are accepted as given.
//! - Identifiers are random and not checked for collision; a clash fails
//!   the insert as a storage error.

use super::{ServiceError, ServiceResult};
use crate::model::contribution::{
    generate_contribution_id, Contribution, ContributionId, ContributionUpsert,
};
use crate::model::contributor::Contributor;
use crate::model::tag::Tag;
use crate::repo::contribution_repo::{ContributionRepository, SqliteContributionRepository};
use crate::repo::contributor_repo::{ContributorRepository, SqliteContributorRepository};
use crate::repo::links::{
    apply_link_changes, insert_links, insert_ordered_contributors, reconcile_links,
    replace_ordered_contributors, resolve_all, CONTRIBUTION_DEPENDENCIES, CONTRIBUTION_TAGS,
};
use crate::repo::tag_repo::{SqliteTagRepository, TagRepository};
use crate::repo::{Page, RepoError};
use log::{error, info};
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Contribution together with its contributors in stored order.
pub type ContributionWithContributors = (Contribution, Vec<Contributor>);

/// Contribution service facade over one open connection.
pub struct ContributionService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ContributionService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Creates one contribution with a fresh random identifier.
    ///
    /// Returns the stored record and the resolved contributors so callers can
    /// render without re-querying.
    pub fn create_contribution(
        &self,
        payload: ContributionUpsert,
    ) -> ServiceResult<ContributionWithContributors> {
        let payload = payload.normalize()?;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let contributor_repo = SqliteContributorRepository::new(&tx);
        let tag_repo = SqliteTagRepository::new(&tx);
        let contribution_repo = SqliteContributionRepository::new(&tx);

        let contributors = resolve_all::<Contributor, _>(
            &payload.contributors,
            "Contributor",
            |id| contributor_repo.get_contributor(*id),
        )?;
        let tags = resolve_all::<Tag, _>(&payload.tags, "Tag", |id| tag_repo.get_tag(*id))?;
        let dependencies = resolve_all::<Contribution, _>(
            &payload.dependencies,
            "Dependency",
            |id| contribution_repo.get_contribution(id),
        )?;

        let contribution = payload.into_contribution(generate_contribution_id());
        if let Err(err) = contribution_repo.create_contribution(&contribution) {
            log_insert_failure(&contribution.id, &err);
            return Err(err.into());
        }
        let id = contribution.id.as_str();
        insert_ordered_contributors(&tx, id, &contributors)?;
        insert_links(&tx, &CONTRIBUTION_TAGS, id, &tags)?;
        insert_links(&tx, &CONTRIBUTION_DEPENDENCIES, id, &dependencies)?;

        let created = contribution_repo
            .get_contribution(id)?
            .ok_or(ServiceError::InconsistentState(
                "created contribution not found in read-back",
            ))?;
        tx.commit()?;

        info!(
            "event=contribution_create module=service status=ok contribution_id={} contributors={} tags={} dependencies={}",
            created.id,
            contributors.len(),
            tags.len(),
            dependencies.len()
        );
        Ok((created, contributors))
    }

    /// Replaces scalar fields and every link set of one contribution.
    ///
    /// Tags and dependencies are reconciled as sets; contributors are fully
    /// rewritten so a pure reordering is persisted.
    pub fn update_contribution(
        &self,
        id: &str,
        payload: ContributionUpsert,
    ) -> ServiceResult<ContributionWithContributors> {
        let payload = payload.normalize()?;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let contributor_repo = SqliteContributorRepository::new(&tx);
        let tag_repo = SqliteTagRepository::new(&tx);
        let contribution_repo = SqliteContributionRepository::new(&tx);

        let mut contribution = contribution_repo
            .get_contribution(id)?
            .ok_or_else(|| ServiceError::missing("Contribution"))?;

        let mut tags = tag_repo.list_for_contribution(id)?;
        let tag_changes = reconcile_links(&mut tags, &payload.tags, "Tag", |tag_id| {
            tag_repo.get_tag(*tag_id)
        })?;
        apply_link_changes(&tx, &CONTRIBUTION_TAGS, id, &tag_changes)?;

        let mut dependencies = contribution_repo.list_dependencies(id)?;
        let dependency_changes = reconcile_links(
            &mut dependencies,
            &payload.dependencies,
            "Dependency",
            |dependency_id| contribution_repo.get_contribution(dependency_id),
        )?;
        apply_link_changes(&tx, &CONTRIBUTION_DEPENDENCIES, id, &dependency_changes)?;

        let contributors = resolve_all::<Contributor, _>(
            &payload.contributors,
            "Contributor",
            |contributor_id| contributor_repo.get_contributor(*contributor_id),
        )?;
        replace_ordered_contributors(&tx, id, &contributors)?;

        contribution.merge_scalars(&payload);
        contribution_repo.update_contribution(&contribution)?;
        let updated = contribution_repo
            .get_contribution(id)?
            .ok_or(ServiceError::InconsistentState(
                "updated contribution not found in read-back",
            ))?;
        tx.commit()?;

        info!(
            "event=contribution_update module=service status=ok contribution_id={} tags_added={} tags_removed={} dependencies_added={} dependencies_removed={} contributors={}",
            id,
            tag_changes.added.len(),
            tag_changes.removed.len(),
            dependency_changes.added.len(),
            dependency_changes.removed.len(),
            contributors.len()
        );
        Ok((updated, contributors))
    }

    pub fn get_contribution(&self, id: &str) -> ServiceResult<Contribution> {
        SqliteContributionRepository::new(self.conn)
            .get_contribution(id)?
            .ok_or_else(|| ServiceError::missing("Contribution"))
    }

    pub fn list_contributions(&self, page: Page) -> ServiceResult<Vec<Contribution>> {
        Ok(SqliteContributionRepository::new(self.conn).list_contributions(page)?)
    }

    /// Contributions that list `id` as a dependency.
    pub fn children(&self, id: &str) -> ServiceResult<Vec<Contribution>> {
        let repo = SqliteContributionRepository::new(self.conn);
        if repo.get_contribution(id)?.is_none() {
            return Err(ServiceError::missing("Contribution"));
        }
        Ok(repo.list_dependents(id)?)
    }

    /// Contributors of one contribution in stored order.
    pub fn contributors(&self, id: &str) -> ServiceResult<Vec<Contributor>> {
        if SqliteContributionRepository::new(self.conn)
            .get_contribution(id)?
            .is_none()
        {
            return Err(ServiceError::missing("Contribution"));
        }
        Ok(SqliteContributorRepository::new(self.conn).list_for_contribution(id)?)
    }
}

fn log_insert_failure(id: &ContributionId, err: &RepoError) {
    let collision = matches!(err, RepoError::Db(db) if db.is_constraint_violation());
    error!(
        "event=contribution_create module=service status=error contribution_id={} id_collision={} error={}",
        id, collision, err
    );
}

#[cfg(test)]
mod tests {
    use super::ContributionService;
    use crate::db::open_db_in_memory;
    use crate::model::contribution::ContributionUpsert;
    use crate::model::contributor::ContributorUpsert;
    use crate::repo::Page;
    use crate::service::contributor_service::ContributorService;
    use crate::service::ServiceError;
    use chrono::NaiveDate;
    use rusqlite::Connection;

    fn payload(title: &str) -> ContributionUpsert {
        ContributionUpsert {
            title: title.to_string(),
            short_title: None,
            date: NaiveDate::from_ymd_opt(2024, 7, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            description: String::new(),
            links: Vec::new(),
            discord_chat_link: None,
            github_link: None,
            forum_link: None,
            wiki_link: None,
            archived_at: None,
            archive_reason: None,
            contributors: Vec::new(),
            tags: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    fn contributor(conn: &Connection, handle: &str) -> i64 {
        ContributorService::new(conn)
            .create_contributor(ContributorUpsert::new(handle))
            .unwrap()
            .id
    }

    #[test]
    fn create_resolves_contributors_before_tags() {
        let conn = open_db_in_memory().unwrap();
        let mut input = payload("BB(5)");
        input.contributors = vec![77];
        input.tags = vec![88];

        let err = ContributionService::new(&conn)
            .create_contribution(input)
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ref what) if what == "Contributor ID 77"));
    }

    #[test]
    fn create_generates_eight_char_id_and_keeps_order() {
        let conn = open_db_in_memory().unwrap();
        let a = contributor(&conn, "a");
        let b = contributor(&conn, "b");
        let mut input = payload("BB(5)");
        input.contributors = vec![b, a];

        let (created, contributors) = ContributionService::new(&conn)
            .create_contribution(input)
            .unwrap();
        assert_eq!(created.id.len(), 8);
        let ids: Vec<i64> = contributors.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![b, a]);
    }

    #[test]
    fn update_can_point_at_itself() {
        let conn = open_db_in_memory().unwrap();
        let service = ContributionService::new(&conn);
        let (created, _) = service.create_contribution(payload("loop")).unwrap();

        let mut input = payload("loop");
        input.dependencies = vec![created.id.clone()];
        service.update_contribution(&created.id, input).unwrap();

        let children = service.children(&created.id).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, created.id);
    }

    #[test]
    fn update_missing_contribution_is_not_found() {
        let conn = open_db_in_memory().unwrap();
        let err = ContributionService::new(&conn)
            .update_contribution("zzzzzzzz", payload("x"))
            .unwrap_err();
        assert_eq!(err.to_string(), "Contribution cannot be found.");
    }

    #[test]
    fn blank_title_is_invalid_input() {
        let conn = open_db_in_memory().unwrap();
        let err = ContributionService::new(&conn)
            .create_contribution(payload("  "))
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert!(ContributionService::new(&conn)
            .list_contributions(Page::default())
            .unwrap()
            .is_empty());
    }
}
