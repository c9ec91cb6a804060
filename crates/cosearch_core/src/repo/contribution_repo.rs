//! Contribution repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist contribution scalar fields (links as JSON text).
//! - Answer the explicit traversal queries that replace navigable
//!   relationships: dependencies, dependents, tagged, contributed, reviewed.
//!
//! # Invariants
//! - Dependency edges are directed: `dependent_id` requires `dependency_id`.
//! - Multi-row reads are deterministic (`ORDER BY`), never hash-ordered.

use super::{from_json_text, to_json_text, Page, RepoError, RepoResult, NOW_MS_SQL};
use crate::model::contribution::{Contribution, ContributionId};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const CONTRIBUTION_SELECT_SQL: &str = "SELECT
    c.id AS id,
    c.title AS title,
    c.short_title AS short_title,
    c.date AS date,
    c.description AS description,
    c.links AS links,
    c.discord_chat_link AS discord_chat_link,
    c.github_link AS github_link,
    c.forum_link AS forum_link,
    c.wiki_link AS wiki_link,
    c.archived_at AS archived_at,
    c.archive_reason AS archive_reason,
    c.created_at AS created_at,
    c.updated_at AS updated_at
FROM contributions c";

/// Repository interface for contribution persistence and traversal.
pub trait ContributionRepository {
    /// Inserts the row with the identifier carried by `contribution`.
    fn create_contribution(&self, contribution: &Contribution) -> RepoResult<()>;
    /// Overwrites scalar fields and bumps `updated_at`.
    fn update_contribution(&self, contribution: &Contribution) -> RepoResult<()>;
    fn get_contribution(&self, id: &str) -> RepoResult<Option<Contribution>>;
    fn list_contributions(&self, page: Page) -> RepoResult<Vec<Contribution>>;
    /// Contributions that `id` depends on.
    fn list_dependencies(&self, id: &str) -> RepoResult<Vec<Contribution>>;
    /// Contributions that depend on `id` (inverse edge direction).
    fn list_dependents(&self, id: &str) -> RepoResult<Vec<Contribution>>;
    fn list_for_tag(&self, tag_id: i64) -> RepoResult<Vec<Contribution>>;
    fn list_for_contributor(&self, contributor_id: i64) -> RepoResult<Vec<Contribution>>;
    /// Fetches the given ids, skipping unknown ones, sorted by id.
    fn list_by_ids(&self, ids: &[ContributionId]) -> RepoResult<Vec<Contribution>>;
}

/// SQLite-backed contribution repository.
pub struct SqliteContributionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContributionRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_many(
        &self,
        sql: &str,
        bind_values: impl rusqlite::Params,
    ) -> RepoResult<Vec<Contribution>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(bind_values)?;
        let mut contributions = Vec::new();
        while let Some(row) = rows.next()? {
            contributions.push(parse_contribution_row(row)?);
        }
        Ok(contributions)
    }
}

impl ContributionRepository for SqliteContributionRepository<'_> {
    fn create_contribution(&self, contribution: &Contribution) -> RepoResult<()> {
        let links = to_json_text("contributions.links", &contribution.links)?;
        self.conn.execute(
            "INSERT INTO contributions (
                id,
                title,
                short_title,
                date,
                description,
                links,
                discord_chat_link,
                github_link,
                forum_link,
                wiki_link,
                archived_at,
                archive_reason
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
            params![
                contribution.id.as_str(),
                contribution.title.as_str(),
                contribution.short_title.as_deref(),
                contribution.date,
                contribution.description.as_str(),
                links,
                contribution.discord_chat_link.as_deref(),
                contribution.github_link.as_deref(),
                contribution.forum_link.as_deref(),
                contribution.wiki_link.as_deref(),
                contribution.archived_at,
                contribution.archive_reason.as_deref(),
            ],
        )?;
        Ok(())
    }

    fn update_contribution(&self, contribution: &Contribution) -> RepoResult<()> {
        let links = to_json_text("contributions.links", &contribution.links)?;
        let changed = self.conn.execute(
            &format!(
                "UPDATE contributions
                 SET
                    title = ?2,
                    short_title = ?3,
                    date = ?4,
                    description = ?5,
                    links = ?6,
                    discord_chat_link = ?7,
                    github_link = ?8,
                    forum_link = ?9,
                    wiki_link = ?10,
                    archived_at = ?11,
                    archive_reason = ?12,
                    updated_at = {NOW_MS_SQL}
                 WHERE id = ?1;"
            ),
            params![
                contribution.id.as_str(),
                contribution.title.as_str(),
                contribution.short_title.as_deref(),
                contribution.date,
                contribution.description.as_str(),
                links,
                contribution.discord_chat_link.as_deref(),
                contribution.github_link.as_deref(),
                contribution.forum_link.as_deref(),
                contribution.wiki_link.as_deref(),
                contribution.archived_at,
                contribution.archive_reason.as_deref(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::not_found("Contribution", &contribution.id));
        }
        Ok(())
    }

    fn get_contribution(&self, id: &str) -> RepoResult<Option<Contribution>> {
        let contribution = self
            .conn
            .query_row(
                &format!("{CONTRIBUTION_SELECT_SQL} WHERE c.id = ?1;"),
                [id],
                |row| Ok(parse_contribution_row(row)),
            )
            .optional()?;
        contribution.transpose()
    }

    fn list_contributions(&self, page: Page) -> RepoResult<Vec<Contribution>> {
        self.query_many(
            &format!("{CONTRIBUTION_SELECT_SQL} ORDER BY c.rowid ASC LIMIT ? OFFSET ?;"),
            params_from_iter(page.bind_values()),
        )
    }

    fn list_dependencies(&self, id: &str) -> RepoResult<Vec<Contribution>> {
        self.query_many(
            &format!(
                "{CONTRIBUTION_SELECT_SQL}
                 INNER JOIN contribution_dependencies d ON d.dependency_id = c.id
                 WHERE d.dependent_id = ?1
                 ORDER BY c.rowid ASC;"
            ),
            [id],
        )
    }

    fn list_dependents(&self, id: &str) -> RepoResult<Vec<Contribution>> {
        self.query_many(
            &format!(
                "{CONTRIBUTION_SELECT_SQL}
                 INNER JOIN contribution_dependencies d ON d.dependent_id = c.id
                 WHERE d.dependency_id = ?1
                 ORDER BY c.rowid ASC;"
            ),
            [id],
        )
    }

    fn list_for_tag(&self, tag_id: i64) -> RepoResult<Vec<Contribution>> {
        self.query_many(
            &format!(
                "{CONTRIBUTION_SELECT_SQL}
                 INNER JOIN contribution_tags ct ON ct.contribution_id = c.id
                 WHERE ct.tag_id = ?1
                 ORDER BY c.rowid ASC;"
            ),
            [tag_id],
        )
    }

    fn list_for_contributor(&self, contributor_id: i64) -> RepoResult<Vec<Contribution>> {
        self.query_many(
            &format!(
                "{CONTRIBUTION_SELECT_SQL}
                 INNER JOIN contribution_contributors cc ON cc.contribution_id = c.id
                 WHERE cc.contributor_id = ?1
                 ORDER BY c.rowid ASC;"
            ),
            [contributor_id],
        )
    }

    fn list_by_ids(&self, ids: &[ContributionId]) -> RepoResult<Vec<Contribution>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        self.query_many(
            &format!("{CONTRIBUTION_SELECT_SQL} WHERE c.id IN ({placeholders}) ORDER BY c.id ASC;"),
            params_from_iter(ids.iter()),
        )
    }
}

fn parse_contribution_row(row: &Row<'_>) -> RepoResult<Contribution> {
    let links_text: String = row.get("links")?;
    Ok(Contribution {
        id: row.get("id")?,
        title: row.get("title")?,
        short_title: row.get("short_title")?,
        date: row.get("date")?,
        description: row.get("description")?,
        links: from_json_text("contributions.links", &links_text)?,
        discord_chat_link: row.get("discord_chat_link")?,
        github_link: row.get("github_link")?,
        forum_link: row.get("forum_link")?,
        wiki_link: row.get("wiki_link")?,
        archived_at: row.get("archived_at")?,
        archive_reason: row.get("archive_reason")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
