//! Association-table reconciliation.
//!
//! # Responsibility
//! - Set reconciliation (`reconcile_links` + `apply_link_changes`) for
//!   contribution↔tag, contribution↔dependency and review↔reviewer.
//! - Ordered full replacement (`replace_ordered_contributors`) for
//!   contribution↔contributor, where position is part of the pair.
//!
//! # Invariants
//! - Every target id is resolved before any association row is written.
//! - Set reconciliation adds before it removes and never duplicates members.
//! - Ordered replacement writes `contributor_order = index` in list order.
//! - Nothing here commits; callers run inside their own transaction.

use super::{RepoError, RepoResult};
use crate::model::contribution::{Contribution, ContributionId};
use crate::model::contributor::{Contributor, ContributorId};
use crate::model::tag::Tag;
use log::debug;
use rusqlite::types::ToSql;
use rusqlite::{params, Connection};
use std::fmt::Display;

/// Record that can sit on the target side of an association table.
pub trait Linked {
    type Id: Clone + PartialEq + Display + ToSql;

    fn link_id(&self) -> Self::Id;
}

impl Linked for Tag {
    type Id = i64;

    fn link_id(&self) -> i64 {
        self.id
    }
}

impl Linked for Contributor {
    type Id = ContributorId;

    fn link_id(&self) -> ContributorId {
        self.id
    }
}

impl Linked for Contribution {
    type Id = ContributionId;

    fn link_id(&self) -> ContributionId {
        self.id.clone()
    }
}

/// Unordered association table description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTable {
    pub table: &'static str,
    /// Column holding the id of the record that owns the collection.
    pub owner_column: &'static str,
    /// Column holding the id of the linked record.
    pub target_column: &'static str,
    /// Label used in `NotFound` messages, e.g. `Tag` → `Tag ID 3`.
    pub label: &'static str,
}

pub const CONTRIBUTION_TAGS: LinkTable = LinkTable {
    table: "contribution_tags",
    owner_column: "contribution_id",
    target_column: "tag_id",
    label: "Tag",
};

/// Owner is the dependent; target is the prerequisite.
pub const CONTRIBUTION_DEPENDENCIES: LinkTable = LinkTable {
    table: "contribution_dependencies",
    owner_column: "dependent_id",
    target_column: "dependency_id",
    label: "Dependency",
};

pub const REVIEW_REVIEWERS: LinkTable = LinkTable {
    table: "contributor_reviews",
    owner_column: "review_id",
    target_column: "contributor_id",
    label: "Reviewer",
};

/// Outcome of one set reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkChanges<K> {
    pub added: Vec<K>,
    pub removed: Vec<K>,
}

impl<K> LinkChanges<K> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Reconciles `current` against `desired` in place.
///
/// Desired ids missing from `current` are resolved and appended; current ids
/// missing from `desired` are resolved and removed. Resolution misses fail
/// with `NotFound` labelled by `label`.
pub fn reconcile_links<T, F>(
    current: &mut Vec<T>,
    desired: &[T::Id],
    label: &str,
    mut resolve: F,
) -> RepoResult<LinkChanges<T::Id>>
where
    T: Linked,
    F: FnMut(&T::Id) -> RepoResult<Option<T>>,
{
    let previous_ids: Vec<T::Id> = current.iter().map(Linked::link_id).collect();
    let mut changes = LinkChanges {
        added: Vec::new(),
        removed: Vec::new(),
    };

    for id in desired {
        if current.iter().any(|item| item.link_id() == *id) {
            continue;
        }
        let target = resolve(id)?.ok_or_else(|| RepoError::not_found(label, id))?;
        current.push(target);
        changes.added.push(id.clone());
    }

    for id in previous_ids {
        if desired.contains(&id) {
            continue;
        }
        if resolve(&id)?.is_none() {
            return Err(RepoError::not_found(label, &id));
        }
        current.retain(|item| item.link_id() != id);
        changes.removed.push(id);
    }

    Ok(changes)
}

/// Writes reconciliation output to an association table.
pub fn apply_link_changes<O, K>(
    conn: &Connection,
    link: &LinkTable,
    owner_id: &O,
    changes: &LinkChanges<K>,
) -> RepoResult<()>
where
    O: ToSql + Display + ?Sized,
    K: ToSql + Display,
{
    let insert_sql = format!(
        "INSERT OR IGNORE INTO {} ({}, {}) VALUES (?1, ?2);",
        link.table, link.owner_column, link.target_column
    );
    for target in &changes.added {
        conn.execute(&insert_sql, params![owner_id, target])?;
        debug!(
            "event=link_add module=repo table={} owner={} target={}",
            link.table, owner_id, target
        );
    }

    let delete_sql = format!(
        "DELETE FROM {} WHERE {} = ?1 AND {} = ?2;",
        link.table, link.owner_column, link.target_column
    );
    for target in &changes.removed {
        conn.execute(&delete_sql, params![owner_id, target])?;
        debug!(
            "event=link_remove module=repo table={} owner={} target={}",
            link.table, owner_id, target
        );
    }
    Ok(())
}

/// Inserts association rows for a fresh owner (no prior state).
pub fn insert_links<O, T>(
    conn: &Connection,
    link: &LinkTable,
    owner_id: &O,
    targets: &[T],
) -> RepoResult<()>
where
    O: ToSql + Display + ?Sized,
    T: Linked,
{
    let changes = LinkChanges {
        added: targets.iter().map(Linked::link_id).collect(),
        removed: Vec::new(),
    };
    apply_link_changes(conn, link, owner_id, &changes)
}

/// Resolves every id in order, failing on the first miss.
///
/// Repeated ids are collapsed to their first occurrence.
pub fn resolve_all<T, F>(ids: &[T::Id], label: &str, mut resolve: F) -> RepoResult<Vec<T>>
where
    T: Linked,
    F: FnMut(&T::Id) -> RepoResult<Option<T>>,
{
    let mut resolved: Vec<T> = Vec::with_capacity(ids.len());
    for id in ids {
        if resolved.iter().any(|item| item.link_id() == *id) {
            continue;
        }
        let target = resolve(id)?.ok_or_else(|| RepoError::not_found(label, id))?;
        resolved.push(target);
    }
    Ok(resolved)
}

/// Replaces the ordered contributor list of one contribution.
///
/// Existing rows are deleted unconditionally, then one row per contributor is
/// written with `contributor_order` equal to its list index. Diffing cannot
/// express a reordering of unchanged members, so this always rewrites.
pub fn replace_ordered_contributors(
    conn: &Connection,
    contribution_id: &str,
    contributors: &[Contributor],
) -> RepoResult<()> {
    let removed = conn.execute(
        "DELETE FROM contribution_contributors WHERE contribution_id = ?1;",
        [contribution_id],
    )?;
    insert_ordered_contributors(conn, contribution_id, contributors)?;
    debug!(
        "event=contributors_replace module=repo contribution_id={} removed={} inserted={}",
        contribution_id,
        removed,
        contributors.len()
    );
    Ok(())
}

/// Writes ordered contributor rows for a contribution with no prior rows.
pub fn insert_ordered_contributors(
    conn: &Connection,
    contribution_id: &str,
    contributors: &[Contributor],
) -> RepoResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO contribution_contributors (
            contribution_id,
            contributor_id,
            contributor_order
        ) VALUES (?1, ?2, ?3);",
    )?;
    for (index, contributor) in contributors.iter().enumerate() {
        let order = i64::try_from(index)
            .map_err(|_| RepoError::InvalidData("contributor list too long".to_string()))?;
        stmt.execute(params![contribution_id, contributor.id, order])?;
    }
    Ok(())
}
