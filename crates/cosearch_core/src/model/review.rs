//! Review domain model.
//!
//! # Invariants
//! - A review always references an existing contribution.
//! - Reviewers form an unordered set of existing contributors.

use super::contribution::ContributionId;
use super::contributor::ContributorId;
use serde::{Deserialize, Serialize};

/// Database-assigned review identifier.
pub type ReviewId = i64;

/// Stored review record. Reviewers live in `contributor_reviews`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub contribution_id: ContributionId,
    pub link: String,
    pub notes: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create/update payload for reviews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewUpsert {
    pub contribution_id: ContributionId,
    pub reviewers: Vec<ContributorId>,
    pub link: String,
    pub notes: String,
}
