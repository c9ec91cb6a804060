//! Read projections returned by the HTTP layer.
//!
//! # Responsibility
//! - Define serde projections for every entity at two depths.
//! - Assemble them from explicit repository traversals.
//!
//! # Invariants
//! - Nesting depth is capped by the types themselves:
//!   `ContributionWithAttributesPublic → ContributionShort →
//!   ContributionDependency`. The leaf carries no links, so rendering never
//!   recurses through dependency cycles.
//! - Contributor lists inside contributions keep stored order.

mod assembler;

pub use assembler::ViewAssembler;

use crate::model::contribution::{Contribution, ContributionId, ContributionLink};
use crate::model::contributor::{Contributor, ContributorId};
use crate::model::review::{Review, ReviewId};
use crate::model::tag::{Tag, TagId};
use chrono::{DateTime, NaiveDateTime, SecondsFormat};
use serde::{ser, Serialize, Serializer};
use std::collections::BTreeMap;

/// Renders stored epoch milliseconds as an RFC 3339 UTC instant,
/// e.g. `2021-01-01T00:00:00.000Z`.
fn serialize_epoch_ms<S>(millis: &i64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let Some(instant) = DateTime::from_timestamp_millis(*millis) else {
        return Err(ser::Error::custom(format!("timestamp out of range: {millis}")));
    };
    serializer.serialize_str(&instant.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributorShort {
    pub id: ContributorId,
    pub local_handle: String,
    pub display_name: Option<String>,
}

impl From<&Contributor> for ContributorShort {
    fn from(value: &Contributor) -> Self {
        Self {
            id: value.id,
            local_handle: value.local_handle.clone(),
            display_name: value.display_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagPublic {
    pub id: TagId,
    pub display_name: String,
    pub color: String,
    #[serde(serialize_with = "serialize_epoch_ms")]
    pub created_at: i64,
    #[serde(serialize_with = "serialize_epoch_ms")]
    pub updated_at: i64,
}

impl From<&Tag> for TagPublic {
    fn from(value: &Tag) -> Self {
        Self {
            id: value.id,
            display_name: value.display_name.clone(),
            color: value.color.clone(),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReviewShort {
    pub id: ReviewId,
}

/// Leaf projection of a contribution; terminates dependency nesting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributionDependency {
    pub id: ContributionId,
    pub title: String,
    pub short_title: Option<String>,
}

impl From<&Contribution> for ContributionDependency {
    fn from(value: &Contribution) -> Self {
        Self {
            id: value.id.clone(),
            title: value.title.clone(),
            short_title: value.short_title.clone(),
        }
    }
}

/// One level of nesting: dependencies are leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributionShort {
    pub id: ContributionId,
    pub title: String,
    pub short_title: Option<String>,
    pub date: NaiveDateTime,
    pub discord_chat_link: Option<String>,
    pub github_link: Option<String>,
    pub forum_link: Option<String>,
    pub wiki_link: Option<String>,
    pub archived_at: Option<NaiveDateTime>,
    pub archive_reason: Option<String>,
    pub contributors: Vec<ContributorShort>,
    pub tags: Vec<TagPublic>,
    pub reviews: Vec<ReviewShort>,
    pub dependencies: Vec<ContributionDependency>,
}

/// Full contribution view; dependencies render as [`ContributionShort`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributionWithAttributesPublic {
    pub id: ContributionId,
    pub title: String,
    pub short_title: Option<String>,
    pub date: NaiveDateTime,
    pub description: String,
    pub links: Vec<ContributionLink>,
    pub discord_chat_link: Option<String>,
    pub github_link: Option<String>,
    pub forum_link: Option<String>,
    pub wiki_link: Option<String>,
    pub archived_at: Option<NaiveDateTime>,
    pub archive_reason: Option<String>,
    #[serde(serialize_with = "serialize_epoch_ms")]
    pub created_at: i64,
    #[serde(serialize_with = "serialize_epoch_ms")]
    pub updated_at: i64,
    pub contributors: Vec<ContributorShort>,
    pub tags: Vec<TagPublic>,
    pub reviews: Vec<ReviewShort>,
    pub dependencies: Vec<ContributionShort>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributorWithAttributesPublic {
    pub id: ContributorId,
    pub local_handle: String,
    pub display_name: Option<String>,
    pub discord_handle: Option<String>,
    pub github_account: Option<String>,
    pub discourse_account: Option<String>,
    pub wiki_account: Option<String>,
    pub website: Option<String>,
    pub extra_info: Option<BTreeMap<String, String>>,
    #[serde(serialize_with = "serialize_epoch_ms")]
    pub created_at: i64,
    #[serde(serialize_with = "serialize_epoch_ms")]
    pub updated_at: i64,
    pub contributions: Vec<ContributionShort>,
}

/// Contributor page: attributes plus the contributions they reviewed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributorViewPublic {
    #[serde(flatten)]
    pub contributor: ContributorWithAttributesPublic,
    pub reviewed_contributions: Vec<ContributionShort>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributorReviewedContributions {
    pub reviewed_contributions: Vec<ContributionShort>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagViewPublic {
    #[serde(flatten)]
    pub tag: TagPublic,
    pub contributions: Vec<ContributionShort>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewPublic {
    pub id: ReviewId,
    pub contribution_id: ContributionId,
    pub link: String,
    pub notes: String,
    #[serde(serialize_with = "serialize_epoch_ms")]
    pub created_at: i64,
    #[serde(serialize_with = "serialize_epoch_ms")]
    pub updated_at: i64,
    pub reviewers: Vec<ContributorShort>,
}

impl ReviewPublic {
    pub fn new(review: Review, reviewers: &[Contributor]) -> Self {
        Self {
            id: review.id,
            contribution_id: review.contribution_id,
            link: review.link,
            notes: review.notes,
            created_at: review.created_at,
            updated_at: review.updated_at,
            reviewers: reviewers.iter().map(ContributorShort::from).collect(),
        }
    }
}

/// Message envelope returned by delete endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ReviewPublic;
    use crate::model::review::Review;
    use serde_json::json;

    #[test]
    fn timestamps_render_as_utc_instants() {
        let review = Review {
            id: 1,
            contribution_id: "abcd1234".to_string(),
            link: String::new(),
            notes: String::new(),
            created_at: 0,
            updated_at: 1_609_459_200_250,
        };
        let value = serde_json::to_value(ReviewPublic::new(review, &[])).unwrap();
        assert_eq!(value["created_at"], json!("1970-01-01T00:00:00.000Z"));
        assert_eq!(value["updated_at"], json!("2021-01-01T00:00:00.250Z"));
    }
}
