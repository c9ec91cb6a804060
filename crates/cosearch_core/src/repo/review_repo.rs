//! Review repository contract and SQLite implementation.
//!
//! Reviewer membership lives in `contributor_reviews` and is written through
//! `repo::links`; this repository only owns the `reviews` rows.

use super::{Page, RepoError, RepoResult, NOW_MS_SQL};
use crate::model::review::{Review, ReviewId};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const REVIEW_SELECT_SQL: &str = "SELECT
    r.id AS id,
    r.contribution_id AS contribution_id,
    r.link AS link,
    r.notes AS notes,
    r.created_at AS created_at,
    r.updated_at AS updated_at
FROM reviews r";

/// Repository interface for review persistence.
pub trait ReviewRepository {
    fn create_review(
        &self,
        contribution_id: &str,
        link: &str,
        notes: &str,
    ) -> RepoResult<ReviewId>;
    fn update_review(
        &self,
        id: ReviewId,
        contribution_id: &str,
        link: &str,
        notes: &str,
    ) -> RepoResult<()>;
    fn get_review(&self, id: ReviewId) -> RepoResult<Option<Review>>;
    fn list_reviews(&self, page: Page) -> RepoResult<Vec<Review>>;
    /// Deletes one review; its `contributor_reviews` rows cascade.
    fn delete_review(&self, id: ReviewId) -> RepoResult<()>;
    /// Review ids attached to one contribution, sorted ascending.
    fn list_ids_for_contribution(&self, contribution_id: &str) -> RepoResult<Vec<ReviewId>>;
    /// Reviews listing `contributor_id` among their reviewers.
    fn list_by_reviewer(&self, contributor_id: i64) -> RepoResult<Vec<Review>>;
}

/// SQLite-backed review repository.
pub struct SqliteReviewRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReviewRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_many(
        &self,
        sql: &str,
        bind_values: impl rusqlite::Params,
    ) -> RepoResult<Vec<Review>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(bind_values)?;
        let mut reviews = Vec::new();
        while let Some(row) = rows.next()? {
            reviews.push(parse_review_row(row)?);
        }
        Ok(reviews)
    }
}

impl ReviewRepository for SqliteReviewRepository<'_> {
    fn create_review(
        &self,
        contribution_id: &str,
        link: &str,
        notes: &str,
    ) -> RepoResult<ReviewId> {
        self.conn.execute(
            "INSERT INTO reviews (contribution_id, link, notes) VALUES (?1, ?2, ?3);",
            params![contribution_id, link, notes],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_review(
        &self,
        id: ReviewId,
        contribution_id: &str,
        link: &str,
        notes: &str,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE reviews
                 SET
                    contribution_id = ?2,
                    link = ?3,
                    notes = ?4,
                    updated_at = {NOW_MS_SQL}
                 WHERE id = ?1;"
            ),
            params![id, contribution_id, link, notes],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("Review", id));
        }
        Ok(())
    }

    fn get_review(&self, id: ReviewId) -> RepoResult<Option<Review>> {
        let review = self
            .conn
            .query_row(
                &format!("{REVIEW_SELECT_SQL} WHERE r.id = ?1;"),
                [id],
                |row| Ok(parse_review_row(row)),
            )
            .optional()?;
        review.transpose()
    }

    fn list_reviews(&self, page: Page) -> RepoResult<Vec<Review>> {
        self.query_many(
            &format!("{REVIEW_SELECT_SQL} ORDER BY r.id ASC LIMIT ? OFFSET ?;"),
            params_from_iter(page.bind_values()),
        )
    }

    fn delete_review(&self, id: ReviewId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM reviews WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::not_found("Review", id));
        }
        Ok(())
    }

    fn list_ids_for_contribution(&self, contribution_id: &str) -> RepoResult<Vec<ReviewId>> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM reviews WHERE contribution_id = ?1 ORDER BY id ASC;",
        )?;
        let ids = stmt
            .query_map([contribution_id], |row| row.get(0))?
            .collect::<Result<Vec<ReviewId>, _>>()?;
        Ok(ids)
    }

    fn list_by_reviewer(&self, contributor_id: i64) -> RepoResult<Vec<Review>> {
        self.query_many(
            &format!(
                "{REVIEW_SELECT_SQL}
                 INNER JOIN contributor_reviews cr ON cr.review_id = r.id
                 WHERE cr.contributor_id = ?1
                 ORDER BY r.id ASC;"
            ),
            [contributor_id],
        )
    }
}

fn parse_review_row(row: &Row<'_>) -> RepoResult<Review> {
    Ok(Review {
        id: row.get("id")?,
        contribution_id: row.get("contribution_id")?,
        link: row.get("link")?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
