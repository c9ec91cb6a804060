//! Uniqueness rules checked before contributor and tag writes.
//!
//! Checks run in a fixed order and report the first violation only. A match
//! on the record being updated (`excluding_id`) is not a violation.

use super::{ServiceError, ServiceResult};
use crate::model::contributor::{ContributorId, ContributorUpsert};
use crate::model::tag::{TagId, TagUpsert};
use crate::repo::contributor_repo::{ContributorRepository, SqliteContributorRepository};
use crate::repo::tag_repo::{SqliteTagRepository, TagRepository};
use rusqlite::Connection;

pub const LOCAL_HANDLE_EXISTS: &str = "Local handle already exists";
pub const LOCAL_HANDLE_USED_AS_DISPLAY_NAME: &str = "Local handle already used as display name";
pub const DISPLAY_NAME_EXISTS: &str = "Display name already exists";
pub const DISPLAY_NAME_USED_AS_LOCAL_HANDLE: &str = "Display name already used as local handle";

/// Checks a normalized contributor payload against every stored contributor.
///
/// | order | collision | condition |
/// |---|---|---|
/// | 1 | `local_handle` = other `local_handle` | [`LOCAL_HANDLE_EXISTS`] |
/// | 2 | `local_handle` = other `display_name` | [`LOCAL_HANDLE_USED_AS_DISPLAY_NAME`] |
/// | 3 | `display_name` = other `display_name` | [`DISPLAY_NAME_EXISTS`] |
/// | 4 | `display_name` = other `local_handle` | [`DISPLAY_NAME_USED_AS_LOCAL_HANDLE`] |
pub fn check_contributor(
    conn: &Connection,
    candidate: &ContributorUpsert,
    excluding_id: Option<ContributorId>,
) -> ServiceResult<()> {
    let repo = SqliteContributorRepository::new(conn);
    let is_other = |id: ContributorId| Some(id) != excluding_id;

    if let Some(found) = repo.find_by_local_handle(&candidate.local_handle)? {
        if is_other(found.id) {
            return Err(ServiceError::condition(LOCAL_HANDLE_EXISTS));
        }
    }
    if let Some(found) = repo.find_by_display_name(&candidate.local_handle)? {
        if is_other(found.id) {
            return Err(ServiceError::condition(LOCAL_HANDLE_USED_AS_DISPLAY_NAME));
        }
    }

    let Some(display_name) = candidate.display_name.as_deref() else {
        return Ok(());
    };
    if let Some(found) = repo.find_by_display_name(display_name)? {
        if is_other(found.id) {
            return Err(ServiceError::condition(DISPLAY_NAME_EXISTS));
        }
    }
    if let Some(found) = repo.find_by_local_handle(display_name)? {
        if is_other(found.id) {
            return Err(ServiceError::condition(DISPLAY_NAME_USED_AS_LOCAL_HANDLE));
        }
    }
    Ok(())
}

/// Checks a tag payload; tag names share nothing with contributor names.
pub fn check_tag(
    conn: &Connection,
    candidate: &TagUpsert,
    excluding_id: Option<TagId>,
) -> ServiceResult<()> {
    let repo = SqliteTagRepository::new(conn);
    match repo.find_by_display_name(&candidate.display_name)? {
        Some(found) if Some(found.id) != excluding_id => {
            Err(ServiceError::condition(DISPLAY_NAME_EXISTS))
        }
        _ => Ok(()),
    }
}
