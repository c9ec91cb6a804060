//! Contribution domain model.
//!
//! # Responsibility
//! - Define the central catalog record and its write payload.
//! - Generate contribution identifiers.
//!
//! # Invariants
//! - Identifiers are 8 characters from `[a-z0-9]`.
//! - Stored URLs are canonical `http`/`https` URLs.
//! - Contributor order is owned by the association table, not this record.

use super::contributor::ContributorId;
use super::tag::TagId;
use super::{
    deserialize_datetime, deserialize_optional_datetime, empty_to_none, normalize_http_url,
    normalize_optional_url, require_text, ValidationError,
};
use chrono::NaiveDateTime;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Random 8-character contribution identifier.
pub type ContributionId = String;

const CONTRIBUTION_ID_LEN: usize = 8;
const CONTRIBUTION_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generates a fresh contribution identifier.
///
/// Uniqueness is not checked against storage; a collision fails the insert
/// with a primary-key violation.
pub fn generate_contribution_id() -> ContributionId {
    let mut rng = rand::thread_rng();
    (0..CONTRIBUTION_ID_LEN)
        .map(|_| {
            let index = rng.gen_range(0..CONTRIBUTION_ID_ALPHABET.len());
            char::from(CONTRIBUTION_ID_ALPHABET[index])
        })
        .collect()
}

/// Embedded `(description, url)` link pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionLink {
    pub description: String,
    pub url: String,
}

/// Stored contribution record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub id: ContributionId,
    pub title: String,
    pub short_title: Option<String>,
    pub date: NaiveDateTime,
    pub description: String,
    /// Stored as a JSON array in `contributions.links`.
    pub links: Vec<ContributionLink>,
    pub discord_chat_link: Option<String>,
    pub github_link: Option<String>,
    pub forum_link: Option<String>,
    pub wiki_link: Option<String>,
    pub archived_at: Option<NaiveDateTime>,
    pub archive_reason: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create/update payload for contributions.
///
/// `contributors` is ordered; `tags` and `dependencies` are sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionUpsert {
    pub title: String,
    #[serde(default)]
    pub short_title: Option<String>,
    #[serde(deserialize_with = "deserialize_datetime")]
    pub date: NaiveDateTime,
    pub description: String,
    pub links: Vec<ContributionLink>,
    #[serde(default)]
    pub discord_chat_link: Option<String>,
    #[serde(default)]
    pub github_link: Option<String>,
    #[serde(default)]
    pub forum_link: Option<String>,
    #[serde(default)]
    pub wiki_link: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub archived_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub archive_reason: Option<String>,
    pub contributors: Vec<ContributorId>,
    pub tags: Vec<TagId>,
    #[serde(default)]
    pub dependencies: Vec<ContributionId>,
}

impl ContributionUpsert {
    /// Applies write normalization and validates URL fields.
    ///
    /// | field | rule |
    /// |---|---|
    /// | `title` | must not be blank |
    /// | `short_title` | `""` → `None` |
    /// | `discord_chat_link` | `""` → `None`, else canonical http(s) URL |
    /// | `github_link` | `""` → `None`, else canonical http(s) URL |
    /// | `forum_link` | `""` → `None`, else canonical http(s) URL |
    /// | `wiki_link` | `""` → `None`, else canonical http(s) URL |
    /// | `links[].url` | canonical http(s) URL |
    ///
    /// `archive_reason` is kept as given.
    pub fn normalize(self) -> Result<Self, ValidationError> {
        require_text("title", &self.title)?;
        let links = self
            .links
            .into_iter()
            .map(|link| {
                Ok(ContributionLink {
                    url: normalize_http_url("links.url", &link.url)?,
                    description: link.description,
                })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        Ok(Self {
            title: self.title,
            short_title: empty_to_none(self.short_title),
            date: self.date,
            description: self.description,
            links,
            discord_chat_link: normalize_optional_url("discord_chat_link", self.discord_chat_link)?,
            github_link: normalize_optional_url("github_link", self.github_link)?,
            forum_link: normalize_optional_url("forum_link", self.forum_link)?,
            wiki_link: normalize_optional_url("wiki_link", self.wiki_link)?,
            archived_at: self.archived_at,
            archive_reason: self.archive_reason,
            contributors: self.contributors,
            tags: self.tags,
            dependencies: self.dependencies,
        })
    }

    /// Builds the record stored for a new contribution.
    pub fn into_contribution(self, id: ContributionId) -> Contribution {
        Contribution {
            id,
            title: self.title,
            short_title: self.short_title,
            date: self.date,
            description: self.description,
            links: self.links,
            discord_chat_link: self.discord_chat_link,
            github_link: self.github_link,
            forum_link: self.forum_link,
            wiki_link: self.wiki_link,
            archived_at: self.archived_at,
            archive_reason: self.archive_reason,
            created_at: 0,
            updated_at: 0,
        }
    }
}

impl Contribution {
    /// Overwrites every scalar field with the (already normalized) payload.
    ///
    /// Identity and timestamps are kept; associations are reconciled
    /// separately by the service layer.
    pub fn merge_scalars(&mut self, payload: &ContributionUpsert) {
        self.title = payload.title.clone();
        self.short_title = payload.short_title.clone();
        self.date = payload.date;
        self.description = payload.description.clone();
        self.links = payload.links.clone();
        self.discord_chat_link = payload.discord_chat_link.clone();
        self.github_link = payload.github_link.clone();
        self.forum_link = payload.forum_link.clone();
        self.wiki_link = payload.wiki_link.clone();
        self.archived_at = payload.archived_at;
        self.archive_reason = payload.archive_reason.clone();
    }
}
