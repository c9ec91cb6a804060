//! Tag use-case service.

use super::integrity::check_tag;
use super::{ServiceError, ServiceResult};
use crate::model::tag::{Tag, TagId, TagUpsert};
use crate::repo::tag_repo::{SqliteTagRepository, TagRepository};
use crate::repo::Page;
use log::info;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Tag service facade over one open connection.
pub struct TagService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> TagService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn create_tag(&self, payload: TagUpsert) -> ServiceResult<Tag> {
        let payload = payload.normalize()?;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        check_tag(&tx, &payload, None)?;

        let repo = SqliteTagRepository::new(&tx);
        let id = repo.create_tag(&payload)?;
        let created = repo.get_tag(id)?.ok_or(ServiceError::InconsistentState(
            "created tag not found in read-back",
        ))?;
        tx.commit()?;

        info!("event=tag_create module=service status=ok tag_id={}", id);
        Ok(created)
    }

    pub fn update_tag(&self, id: TagId, payload: TagUpsert) -> ServiceResult<Tag> {
        let payload = payload.normalize()?;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let repo = SqliteTagRepository::new(&tx);
        if repo.get_tag(id)?.is_none() {
            return Err(ServiceError::missing("Tag"));
        }
        check_tag(&tx, &payload, Some(id))?;

        repo.update_tag(id, &payload)?;
        let updated = repo.get_tag(id)?.ok_or(ServiceError::InconsistentState(
            "updated tag not found in read-back",
        ))?;
        tx.commit()?;

        info!("event=tag_update module=service status=ok tag_id={}", id);
        Ok(updated)
    }

    /// Deletes one tag and, through the cascade, its contribution links.
    pub fn delete_tag(&self, id: TagId) -> ServiceResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let repo = SqliteTagRepository::new(&tx);
        if repo.get_tag(id)?.is_none() {
            return Err(ServiceError::missing("Tag"));
        }
        repo.delete_tag(id)?;
        tx.commit()?;

        info!("event=tag_delete module=service status=ok tag_id={}", id);
        Ok(())
    }

    pub fn get_tag(&self, id: TagId) -> ServiceResult<Tag> {
        SqliteTagRepository::new(self.conn)
            .get_tag(id)?
            .ok_or_else(|| ServiceError::missing("Tag"))
    }

    pub fn list_tags(&self, page: Page) -> ServiceResult<Vec<Tag>> {
        Ok(SqliteTagRepository::new(self.conn).list_tags(page)?)
    }
}
