//! Contributor repository contract and SQLite implementation.
//!
//! # Invariants
//! - `local_handle`/`display_name` uniqueness is also backed by UNIQUE
//!   constraints; the integrity validator reports violations first.
//! - Writes expect an already normalized `ContributorUpsert`.

use super::{from_json_text, to_json_text, Page, RepoError, RepoResult, NOW_MS_SQL};
use crate::model::contributor::{Contributor, ContributorId, ContributorUpsert};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;

const CONTRIBUTOR_SELECT_SQL: &str = "SELECT
    c.id AS id,
    c.local_handle AS local_handle,
    c.display_name AS display_name,
    c.discord_handle AS discord_handle,
    c.github_account AS github_account,
    c.discourse_account AS discourse_account,
    c.wiki_account AS wiki_account,
    c.website AS website,
    c.extra_info AS extra_info,
    c.created_at AS created_at,
    c.updated_at AS updated_at
FROM contributors c";

/// Repository interface for contributor persistence.
pub trait ContributorRepository {
    fn create_contributor(&self, payload: &ContributorUpsert) -> RepoResult<ContributorId>;
    /// Fully replaces the stored fields of one contributor.
    fn update_contributor(
        &self,
        id: ContributorId,
        payload: &ContributorUpsert,
    ) -> RepoResult<()>;
    fn get_contributor(&self, id: ContributorId) -> RepoResult<Option<Contributor>>;
    fn find_by_local_handle(&self, local_handle: &str) -> RepoResult<Option<Contributor>>;
    fn find_by_display_name(&self, display_name: &str) -> RepoResult<Option<Contributor>>;
    fn list_contributors(&self, page: Page) -> RepoResult<Vec<Contributor>>;
    /// Contributors of one contribution in stored `contributor_order`.
    fn list_for_contribution(&self, contribution_id: &str) -> RepoResult<Vec<Contributor>>;
    /// Reviewers of one review, sorted by id.
    fn list_for_review(&self, review_id: i64) -> RepoResult<Vec<Contributor>>;
}

/// SQLite-backed contributor repository.
pub struct SqliteContributorRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContributorRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_one(
        &self,
        where_sql: &str,
        value: &dyn rusqlite::ToSql,
    ) -> RepoResult<Option<Contributor>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONTRIBUTOR_SELECT_SQL} WHERE {where_sql} LIMIT 1;"))?;
        let row = stmt
            .query_row(params![value], |row| Ok(parse_contributor_row(row)))
            .optional()?;
        row.transpose()
    }

    fn query_many(
        &self,
        sql: &str,
        bind_values: impl rusqlite::Params,
    ) -> RepoResult<Vec<Contributor>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(bind_values)?;
        let mut contributors = Vec::new();
        while let Some(row) = rows.next()? {
            contributors.push(parse_contributor_row(row)?);
        }
        Ok(contributors)
    }
}

impl ContributorRepository for SqliteContributorRepository<'_> {
    fn create_contributor(&self, payload: &ContributorUpsert) -> RepoResult<ContributorId> {
        let extra_info = encode_extra_info(payload.extra_info.as_ref())?;
        self.conn.execute(
            "INSERT INTO contributors (
                local_handle,
                display_name,
                discord_handle,
                github_account,
                discourse_account,
                wiki_account,
                website,
                extra_info
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                payload.local_handle.as_str(),
                payload.display_name.as_deref(),
                payload.discord_handle.as_deref(),
                payload.github_account.as_deref(),
                payload.discourse_account.as_deref(),
                payload.wiki_account.as_deref(),
                payload.website.as_deref(),
                extra_info,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_contributor(
        &self,
        id: ContributorId,
        payload: &ContributorUpsert,
    ) -> RepoResult<()> {
        let extra_info = encode_extra_info(payload.extra_info.as_ref())?;
        let changed = self.conn.execute(
            &format!(
                "UPDATE contributors
                 SET
                    local_handle = ?2,
                    display_name = ?3,
                    discord_handle = ?4,
                    github_account = ?5,
                    discourse_account = ?6,
                    wiki_account = ?7,
                    website = ?8,
                    extra_info = ?9,
                    updated_at = {NOW_MS_SQL}
                 WHERE id = ?1;"
            ),
            params![
                id,
                payload.local_handle.as_str(),
                payload.display_name.as_deref(),
                payload.discord_handle.as_deref(),
                payload.github_account.as_deref(),
                payload.discourse_account.as_deref(),
                payload.wiki_account.as_deref(),
                payload.website.as_deref(),
                extra_info,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::not_found("Contributor", id));
        }
        Ok(())
    }

    fn get_contributor(&self, id: ContributorId) -> RepoResult<Option<Contributor>> {
        self.query_one("c.id = ?1", &id)
    }

    fn find_by_local_handle(&self, local_handle: &str) -> RepoResult<Option<Contributor>> {
        self.query_one("c.local_handle = ?1", &local_handle)
    }

    fn find_by_display_name(&self, display_name: &str) -> RepoResult<Option<Contributor>> {
        self.query_one("c.display_name = ?1", &display_name)
    }

    fn list_contributors(&self, page: Page) -> RepoResult<Vec<Contributor>> {
        self.query_many(
            &format!("{CONTRIBUTOR_SELECT_SQL} ORDER BY c.id ASC LIMIT ? OFFSET ?;"),
            params_from_iter(page.bind_values()),
        )
    }

    fn list_for_contribution(&self, contribution_id: &str) -> RepoResult<Vec<Contributor>> {
        self.query_many(
            &format!(
                "{CONTRIBUTOR_SELECT_SQL}
                 INNER JOIN contribution_contributors cc ON cc.contributor_id = c.id
                 WHERE cc.contribution_id = ?1
                 ORDER BY cc.contributor_order ASC, c.id ASC;"
            ),
            [contribution_id],
        )
    }

    fn list_for_review(&self, review_id: i64) -> RepoResult<Vec<Contributor>> {
        self.query_many(
            &format!(
                "{CONTRIBUTOR_SELECT_SQL}
                 INNER JOIN contributor_reviews cr ON cr.contributor_id = c.id
                 WHERE cr.review_id = ?1
                 ORDER BY c.id ASC;"
            ),
            [review_id],
        )
    }
}

fn encode_extra_info(value: Option<&BTreeMap<String, String>>) -> RepoResult<Option<String>> {
    value
        .map(|map| to_json_text("contributors.extra_info", map))
        .transpose()
}

fn parse_contributor_row(row: &Row<'_>) -> RepoResult<Contributor> {
    let extra_info = match row.get::<_, Option<String>>("extra_info")? {
        Some(text) => Some(from_json_text("contributors.extra_info", &text)?),
        None => None,
    };

    Ok(Contributor {
        id: row.get("id")?,
        local_handle: row.get("local_handle")?,
        display_name: row.get("display_name")?,
        discord_handle: row.get("discord_handle")?,
        github_account: row.get("github_account")?,
        discourse_account: row.get("discourse_account")?,
        wiki_account: row.get("wiki_account")?,
        website: row.get("website")?,
        extra_info,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
