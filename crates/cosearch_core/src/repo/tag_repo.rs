//! Tag repository contract and SQLite implementation.

use super::{Page, RepoError, RepoResult, NOW_MS_SQL};
use crate::model::tag::{Tag, TagId, TagUpsert};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const TAG_SELECT_SQL: &str = "SELECT
    t.id AS id,
    t.display_name AS display_name,
    t.color AS color,
    t.created_at AS created_at,
    t.updated_at AS updated_at
FROM tags t";

/// Repository interface for tag persistence.
pub trait TagRepository {
    fn create_tag(&self, payload: &TagUpsert) -> RepoResult<TagId>;
    fn update_tag(&self, id: TagId, payload: &TagUpsert) -> RepoResult<()>;
    fn get_tag(&self, id: TagId) -> RepoResult<Option<Tag>>;
    fn find_by_display_name(&self, display_name: &str) -> RepoResult<Option<Tag>>;
    fn list_tags(&self, page: Page) -> RepoResult<Vec<Tag>>;
    /// Deletes one tag; its `contribution_tags` rows cascade.
    fn delete_tag(&self, id: TagId) -> RepoResult<()>;
    /// Tags attached to one contribution, sorted by id.
    fn list_for_contribution(&self, contribution_id: &str) -> RepoResult<Vec<Tag>>;
}

/// SQLite-backed tag repository.
pub struct SqliteTagRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTagRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_many(&self, sql: &str, bind_values: impl rusqlite::Params) -> RepoResult<Vec<Tag>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(bind_values)?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            tags.push(parse_tag_row(row)?);
        }
        Ok(tags)
    }
}

impl TagRepository for SqliteTagRepository<'_> {
    fn create_tag(&self, payload: &TagUpsert) -> RepoResult<TagId> {
        self.conn.execute(
            "INSERT INTO tags (display_name, color) VALUES (?1, ?2);",
            params![payload.display_name.as_str(), payload.color.as_str()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_tag(&self, id: TagId, payload: &TagUpsert) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE tags
                 SET
                    display_name = ?2,
                    color = ?3,
                    updated_at = {NOW_MS_SQL}
                 WHERE id = ?1;"
            ),
            params![id, payload.display_name.as_str(), payload.color.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("Tag", id));
        }
        Ok(())
    }

    fn get_tag(&self, id: TagId) -> RepoResult<Option<Tag>> {
        let tag = self
            .conn
            .query_row(
                &format!("{TAG_SELECT_SQL} WHERE t.id = ?1;"),
                [id],
                |row| Ok(parse_tag_row(row)),
            )
            .optional()?;
        tag.transpose()
    }

    fn find_by_display_name(&self, display_name: &str) -> RepoResult<Option<Tag>> {
        let tag = self
            .conn
            .query_row(
                &format!("{TAG_SELECT_SQL} WHERE t.display_name = ?1 LIMIT 1;"),
                [display_name],
                |row| Ok(parse_tag_row(row)),
            )
            .optional()?;
        tag.transpose()
    }

    fn list_tags(&self, page: Page) -> RepoResult<Vec<Tag>> {
        self.query_many(
            &format!("{TAG_SELECT_SQL} ORDER BY t.id ASC LIMIT ? OFFSET ?;"),
            params_from_iter(page.bind_values()),
        )
    }

    fn delete_tag(&self, id: TagId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM tags WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::not_found("Tag", id));
        }
        Ok(())
    }

    fn list_for_contribution(&self, contribution_id: &str) -> RepoResult<Vec<Tag>> {
        self.query_many(
            &format!(
                "{TAG_SELECT_SQL}
                 INNER JOIN contribution_tags ct ON ct.tag_id = t.id
                 WHERE ct.contribution_id = ?1
                 ORDER BY t.id ASC;"
            ),
            [contribution_id],
        )
    }
}

fn parse_tag_row(row: &Row<'_>) -> RepoResult<Tag> {
    Ok(Tag {
        id: row.get("id")?,
        display_name: row.get("display_name")?,
        color: row.get("color")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
